use std::path::PathBuf;

/// Errors raised while resolving, loading, or persisting dataset items.
///
/// None of these are recovered inside the crate. They propagate to whatever
/// drives the dataset, which decides whether to skip the item or abort.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Invalid dataset configuration, detected at construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A filename key did not split into the expected number of tokens.
    #[error("malformed filename key {key:?}: expected {expected} fields, found {found}")]
    Parse {
        key: String,
        expected: usize,
        found: usize,
    },

    /// The source image for an item does not exist.
    #[error("image not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decoding or encoding an image failed.
    #[error("image codec error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Index outside `0..len`.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Tensor data had the wrong element type or shape.
    #[error("tensor data error: {0}")]
    Data(String),

    /// A `.npy` file could not be parsed.
    #[error("malformed npy file {}: {reason}", path.display())]
    Npy { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, DatasetError>;

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps an error from `image::open` to the crate taxonomy, keeping a
    /// missing file distinct from a corrupt one.
    pub(crate) fn from_image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        let path = path.into();
        match source {
            image::ImageError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                DatasetError::NotFound { path }
            }
            image::ImageError::IoError(e) => DatasetError::Io { path, source: e },
            source => DatasetError::Image { path, source },
        }
    }
}
