use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use burn::{config::Config, tensor::TensorData};
use half::f16;
use image::{RgbImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

use crate::error::DatasetError;

/// Codec settings for persisted results.
///
/// Visualisations are always `RgbImage`s (R, G, B byte order, `0..=255`) and
/// are always encoded as baseline JPEG at `jpeg_quality`.
#[derive(Config, Debug)]
pub struct SaveConfig {
    /// JPEG quality in `1..=100`.
    #[config(default = 75)]
    pub jpeg_quality: u8,
}

/// Paths written by a single [`save_result`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedResult {
    pub prediction: PathBuf,
    pub visualisation: Option<PathBuf>,
}

/// Narrows any float tensor data to half precision, keeping its shape.
pub fn to_half(prediction: &TensorData) -> crate::error::Result<(Vec<usize>, Vec<f16>)> {
    let values = prediction
        .clone()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| DatasetError::Data(format!("{e:?}")))?;

    Ok((
        prediction.shape.clone(),
        values.into_iter().map(f16::from_f32).collect(),
    ))
}

/// Persists a prediction and an optional visualisation under `savepath`.
///
/// # Parameters
///
/// * `savepath` – Output directory, created (recursively) if missing.
/// * `name` – Leaf name shared by both files, without extension.
/// * `prediction` – Array of any shape; written to `<name>.npy` as `f16`.
/// * `visualisation` – When present, written to `<name>.jpg`.
///
/// # Notes
///
/// - Existing files are overwritten.
/// - The precision loss is deterministic: the same input always yields the
///   same bytes on disk.
///
pub fn save_result(
    savepath: &Path,
    name: &str,
    prediction: &TensorData,
    visualisation: Option<&RgbImage>,
    config: &SaveConfig,
) -> crate::error::Result<SavedResult> {
    fs::create_dir_all(savepath).map_err(|e| DatasetError::io(savepath, e))?;

    let npy_path = savepath.join(format!("{name}.npy"));
    let (shape, values) = to_half(prediction)?;
    crate::npy::write_f16(&npy_path, &shape, &values)?;
    debug!(path = %npy_path.display(), ?shape, "wrote prediction");

    let visualisation = match visualisation {
        Some(image) => {
            let jpg_path = savepath.join(format!("{name}.jpg"));
            write_jpeg(&jpg_path, image, config.jpeg_quality)?;
            debug!(path = %jpg_path.display(), "wrote visualisation");
            Some(jpg_path)
        }
        None => None,
    };

    Ok(SavedResult {
        prediction: npy_path,
        visualisation,
    })
}

fn write_jpeg(path: &Path, image: &RgbImage, quality: u8) -> crate::error::Result<()> {
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        .map_err(|source| DatasetError::Image {
            path: path.to_path_buf(),
            source,
        })?;

    writer.flush().map_err(|e| DatasetError::io(path, e))
}
