use std::path::Path;

use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{Tensor, backend::Backend, s},
};
use tracing::info;

use crate::{
    config::RunConfig,
    data::{InferenceBatch, InferenceBatcher},
    datasets::{ImageSource, InferenceDataset},
    error::{DatasetError, Result},
    persist::SavedResult,
    stats::Stats,
    transforms::{chw_to_rgb_image, pipeline::CHANNELS},
};

/// The model side of an inference run: maps a `[N, 3, H, W]` batch of
/// images to a `[N, C, H', W']` batch of predictions.
pub trait Predictor<B: Backend> {
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
}

impl<B: Backend, F> Predictor<B> for F
where
    F: Fn(Tensor<B, 4>) -> Tensor<B, 4>,
{
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self(images)
    }
}

/// Returns the preprocessed images as the prediction. Used to export the
/// network inputs exactly as a model would see them.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityPredictor;

impl<B: Backend> Predictor<B> for IdentityPredictor {
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        images
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub items: usize,
    pub saved: Vec<SavedResult>,
}

/// Runs `predictor` over every item of `dataset` and persists each prediction
/// through the dataset's output layout under `savepath`.
///
/// # Parameters
/// - `dataset`: Items are visited in index order, `config.batch_size` at a time.
/// - `predictor`: Must return one prediction per input image.
/// - `config`: Batch size, visualisation switch, codec settings and log path.
/// - `device`: Device the batches are built on.
///
/// # Output
/// - One `.npy` per item and, when `config.save_visualisation` is set, one
///   `.jpg`: the prediction itself if it has 3 channels, otherwise the resized
///   input image.
///
/// The first failing item aborts the run and its error is returned.
pub fn run<B, S, P>(
    dataset: &InferenceDataset<S>,
    predictor: &P,
    config: &RunConfig,
    savepath: &Path,
    device: &B::Device,
) -> Result<RunSummary>
where
    B: Backend,
    S: ImageSource,
    P: Predictor<B>,
{
    if config.batch_size == 0 {
        return Err(DatasetError::Config("batch_size must be positive".into()));
    }

    let batcher = InferenceBatcher::new();
    let mut stats = Stats::new(Path::new(&config.log_path))?;
    let total = dataset.len();
    let mut saved = Vec::with_capacity(total);

    info!(items = total, savepath = %savepath.display(), "starting inference run");

    let indices: Vec<usize> = (0..total).collect();
    for chunk in indices.chunks(config.batch_size) {
        let items = chunk
            .iter()
            .map(|&i| dataset.get(i))
            .collect::<Result<Vec<_>>>()?;

        let batch: InferenceBatch<B> = batcher.batch(items, device);
        let predictions = predictor.predict(batch.images.clone());

        let [n, channels, _, _] = predictions.dims();
        if n != chunk.len() {
            return Err(DatasetError::Data(format!(
                "predictor returned {n} predictions for a batch of {}",
                chunk.len()
            )));
        }

        for (row, &index) in chunk.iter().enumerate() {
            let prediction = predictions
                .clone()
                .slice(s![row])
                .squeeze::<3>(0)
                .into_data();

            let visualisation = if !config.save_visualisation {
                None
            } else if channels == CHANNELS {
                Some(chw_to_rgb_image(&prediction)?)
            } else {
                let input = batch.images.clone().slice(s![row]).squeeze::<3>(0);
                Some(chw_to_rgb_image(&input.into_data())?)
            };

            saved.push(dataset.save_result(
                index,
                savepath,
                &prediction,
                visualisation.as_ref(),
                &config.save,
            )?);
        }

        stats.update(chunk.len(), total, "Infer");
    }

    stats.flush()?;
    info!(items = saved.len(), "inference run finished");

    Ok(RunSummary {
        items: saved.len(),
        saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::tests::flat_dataset;
    use crate::npy::read_f16;
    use burn::backend::{NdArray, ndarray::NdArrayDevice};

    type B = NdArray<f32>;

    fn config(log_dir: &Path) -> RunConfig {
        RunConfig::new()
            .with_batch_size(2)
            .with_log_path(log_dir.join("log.txt").display().to_string())
    }

    #[test]
    fn identity_run_writes_every_item() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5), (40, 10), (3, 9)]);

        let config = config(data.path());
        let summary =
            run::<B, _, _>(&ds, &IdentityPredictor, &config, out.path(), &device).unwrap();

        assert_eq!(summary.items, 3);
        for (i, saved) in summary.saved.iter().enumerate() {
            assert_eq!(saved.prediction, out.path().join(format!("{i}.npy")));
            assert!(saved.visualisation.as_ref().unwrap().is_file());
            let (shape, _) = read_f16(&saved.prediction).unwrap();
            assert_eq!(shape, vec![3, 12, 20]);
        }
    }

    #[test]
    fn single_channel_predictions_fall_back_to_input_visualisation() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5), (8, 8)]);

        let mean = |images: Tensor<B, 4>| images.mean_dim(1);
        let config = config(data.path());
        let summary = run::<B, _, _>(&ds, &mean, &config, out.path(), &device).unwrap();

        let (shape, _) = read_f16(&summary.saved[1].prediction).unwrap();
        assert_eq!(shape, vec![1, 12, 20]);
        let vis = image::open(summary.saved[1].visualisation.as_ref().unwrap()).unwrap();
        assert_eq!((vis.width(), vis.height()), (20, 12));
    }

    #[test]
    fn visualisations_can_be_disabled() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5)]);

        let config = config(data.path()).with_save_visualisation(false);
        let summary =
            run::<B, _, _>(&ds, &IdentityPredictor, &config, out.path(), &device).unwrap();

        assert_eq!(summary.saved[0].visualisation, None);
        assert!(!out.path().join("0.jpg").exists());
    }

    #[test]
    fn predictor_dropping_items_is_an_error() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5), (6, 6)]);

        let first_only = |images: Tensor<B, 4>| images.slice(s![0..1]);
        let result = run::<B, _, _>(&ds, &first_only, &config(data.path()), out.path(), &device);

        assert!(matches!(result, Err(DatasetError::Data(_))));
    }

    #[test]
    fn missing_image_aborts_the_run() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5), (6, 6)]);
        std::fs::remove_file(data.path().join("img1.png")).unwrap();

        let config = config(data.path());
        let result = run::<B, _, _>(&ds, &IdentityPredictor, &config, out.path(), &device);
        assert!(matches!(result, Err(DatasetError::NotFound { .. })));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let device = NdArrayDevice::default();
        let data = tempfile::tempdir().unwrap();
        let ds = flat_dataset(data.path(), &[(5, 5)]);

        let config = config(data.path()).with_batch_size(0);
        let result = run::<B, _, _>(&ds, &IdentityPredictor, &config, data.path(), &device);
        assert!(matches!(result, Err(DatasetError::Config(_))));
    }
}
