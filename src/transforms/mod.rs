pub mod pipeline;
pub mod resize;
pub mod to_image;

pub use pipeline::{ImagePipeline, Transform};
pub use to_image::chw_to_rgb_image;
