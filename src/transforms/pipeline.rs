use burn::tensor::TensorData;
use image::{DynamicImage, RgbImage};

/// Maximum pixel value for a RGB8 pixel
pub const MAX_PIXEL_VAL: f32 = 255.0;

/// Number of channels every transformed image carries.
pub const CHANNELS: usize = 3;

/// A chained image transformation ending in a channel-first tensor.
///
/// `Transform` wraps a decoded image of any colour mode and size. Geometric
/// steps operate on the image itself; [`Transform::finish`] converts the result
/// into [`TensorData`] of shape `[3, H, W]` with values scaled to `[0, 1]`.
///
/// # Example
///
/// ```rust,ignore
/// let data = Transform::new(image::open("frame.jpg")?)
///     .resize_antialiased(640, 192)
///     .finish();
/// assert_eq!(data.shape, vec![3, 192, 640]);
/// ```
#[derive(Clone, Debug)]
pub struct Transform {
    pub image: DynamicImage,
}

impl Transform {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Finalizes the chain, converting the image to RGB and then to a
    /// `[C, H, W]` tensor in the unit range.
    pub fn finish(self) -> TensorData {
        Self::rgb_img_as_tensor_data(&self.image.to_rgb8())
    }

    /// Converts an `image::RgbImage` into `[3, H, W]` tensor data.
    ///
    /// The interleaved `[H, W, C]` pixel buffer is de-interleaved into planes
    /// and every value is divided by [`MAX_PIXEL_VAL`].
    pub fn rgb_img_as_tensor_data(image: &RgbImage) -> TensorData {
        let (width, height) = image.dimensions();
        let npix = (width * height) as usize;
        let raw = image.as_raw();

        let mut planes = vec![0.0f32; CHANNELS * npix];
        for (i, px) in raw.chunks_exact(CHANNELS).enumerate() {
            for (c, &v) in px.iter().enumerate() {
                planes[c * npix + i] = v as f32 / MAX_PIXEL_VAL;
            }
        }

        TensorData::new(planes, [CHANNELS, height as usize, width as usize])
    }
}

/// The fixed preprocessing applied to every dataset item: resize to exactly
/// `height x width` with an antialiasing filter, then convert to a unit-range
/// channel-first tensor. Aspect ratio is not preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImagePipeline {
    pub height: u32,
    pub width: u32,
}

impl ImagePipeline {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    pub fn apply(&self, image: DynamicImage) -> TensorData {
        Transform::new(image)
            .resize_antialiased(self.width, self.height)
            .finish()
    }
}

/// A `width` x `height` image filled with a single colour.
#[cfg(test)]
pub(crate) fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb(rgb))
}
