use super::pipeline::{CHANNELS, MAX_PIXEL_VAL};
use crate::error::{DatasetError, Result};
use burn::tensor::TensorData;
use image::RgbImage;

/// Converts `[3, H, W]` tensor data with values in `[0, 1]` back into an
/// 8-bit RGB image, the inverse of
/// [`Transform::rgb_img_as_tensor_data`](super::Transform::rgb_img_as_tensor_data).
///
/// # Notes
///
/// - Any float element type is accepted; values are converted to `f32` first.
/// - Values are clamped to `[0, 1]` and rounded to the nearest byte.
/// - The channel order of the result is R, G, B.
///
pub fn chw_to_rgb_image(data: &TensorData) -> Result<RgbImage> {
    let &[ch, height, width] = data.shape.as_slice() else {
        return Err(DatasetError::Data(format!(
            "expected [C, H, W] image data, got shape {:?}",
            data.shape
        )));
    };

    if ch != CHANNELS {
        return Err(DatasetError::Data(format!(
            "expected {CHANNELS} channels, got {ch}"
        )));
    }

    let values = data
        .clone()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| DatasetError::Data(format!("{e:?}")))?;

    let npix = height * width;
    let mut buf = Vec::with_capacity(CHANNELS * npix);
    for i in 0..npix {
        for c in 0..CHANNELS {
            let v = values[c * npix + i].clamp(0.0, 1.0) * MAX_PIXEL_VAL;
            buf.push(v.round() as u8);
        }
    }

    RgbImage::from_vec(width as u32, height as u32, buf)
        .ok_or_else(|| DatasetError::Data("pixel buffer does not match image size".into()))
}
