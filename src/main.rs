use std::path::Path;
use std::process::ExitCode;

use burn::backend::{NdArray, ndarray::NdArrayDevice};
use burn::config::Config;
use rust_footprints::{
    config::{Commands, DatasetKind, FootprintsCmd, InferenceConfig},
    datasets::{ImageSource, InferenceDataset, KittiSource, MatterportSource, read_filenames},
    error::{DatasetError, Result},
    inference::{self, IdentityPredictor},
};
use tracing::error;
use tracing_subscriber::EnvFilter;

type InferBackend = NdArray<f32>;

fn resolve<S: ImageSource>(dataset: &InferenceDataset<S>, out: &Path) -> Result<()> {
    for index in 0..dataset.len() {
        let source = dataset.source_path(index)?;
        let output = dataset.output_location(index, out)?;
        println!("{} -> {}", source.display(), output.npy_path().display());
    }
    Ok(())
}

fn execute<S: ImageSource>(
    cli_cmd: &FootprintsCmd,
    config: &InferenceConfig,
    filenames: Vec<String>,
    source: S,
) -> Result<()> {
    let dataset = InferenceDataset::new(
        &config.data_path,
        filenames,
        config.height,
        config.width,
        source,
    )?;

    match &cli_cmd.commands {
        Commands::Resolve(sub_command_resolve) => {
            let out = sub_command_resolve.out.as_deref().unwrap_or("./results");
            resolve(&dataset, Path::new(out))
        }
        Commands::Export(sub_command_export) => {
            let mut run_config = config.run.clone();
            if let Some(batch_size) = sub_command_export.b {
                run_config.batch_size = batch_size;
            }

            let device = NdArrayDevice::default();
            let summary = inference::run::<InferBackend, _, _>(
                &dataset,
                &IdentityPredictor,
                &run_config,
                Path::new(&sub_command_export.out),
                &device,
            )?;
            println!("saved {} results to {}", summary.items, sub_command_export.out);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli_cmd: FootprintsCmd = argh::from_env();

    let result = InferenceConfig::load(&cli_cmd.config)
        .map_err(|e| DatasetError::Config(format!("{}: {e:?}", cli_cmd.config)))
        .and_then(|config| {
            let filenames = read_filenames(Path::new(&config.split_file))?;
            match config.dataset {
                DatasetKind::Kitti => execute(
                    &cli_cmd,
                    &config,
                    filenames,
                    KittiSource::new(config.image_ext.clone()),
                ),
                DatasetKind::Matterport => execute(&cli_cmd, &config, filenames, MatterportSource),
            }
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
