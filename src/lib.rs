pub mod config;
pub mod data;
pub mod datasets;
pub mod error;
pub mod inference;
pub mod keys;
pub mod npy;
pub mod persist;
pub mod stats;
pub mod transforms;

pub use datasets::{
    ImageSource, InferenceDataset, InferenceItem, KittiInferenceDataset, KittiSource, LoadedItem,
    MatterportInferenceDataset, MatterportSource, OutputLocation,
};
pub use error::{DatasetError, Result};
