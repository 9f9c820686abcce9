//! Indexed inference datasets over split files of filename keys.
//!
//! An [`InferenceDataset`] owns the raw keys and the target image size; the
//! dataset-specific part (how a key maps to files on disk) lives behind the
//! [`ImageSource`] trait, implemented by [`KittiSource`] and
//! [`MatterportSource`].

pub mod kitti;
pub mod matterport;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::data::dataset::Dataset;
use burn::tensor::TensorData;
use image::{DynamicImage, RgbImage};
use tracing::{debug, error};

use crate::error::{DatasetError, Result};
use crate::persist::{SaveConfig, SavedResult, save_result};
use crate::transforms::ImagePipeline;

pub use kitti::KittiSource;
pub use matterport::MatterportSource;

pub type KittiInferenceDataset = InferenceDataset<KittiSource>;
pub type MatterportInferenceDataset = InferenceDataset<MatterportSource>;

/// Where the result for one item is written: `<dir>/<name>.npy`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLocation {
    pub dir: PathBuf,
    pub name: String,
}

impl OutputLocation {
    pub fn npy_path(&self) -> PathBuf {
        self.dir.join(format!("{}.npy", self.name))
    }
}

/// Maps filename keys of one dataset to source images and result locations.
pub trait ImageSource: Send + Sync {
    /// Path of the source image described by `key`.
    fn source_path(&self, data_path: &Path, key: &str) -> Result<PathBuf>;

    /// Output directory and leaf name for the result of item `index`.
    fn output_location(&self, savepath: &Path, index: usize, key: &str) -> Result<OutputLocation>;

    /// Decodes the source image for `key`.
    ///
    /// A missing file is reported as [`DatasetError::NotFound`].
    fn load_image(&self, data_path: &Path, key: &str) -> Result<DynamicImage> {
        let path = self.source_path(data_path, key)?;
        debug!(path = %path.display(), "loading image");
        image::open(&path).map_err(|e| DatasetError::from_image(path, e))
    }
}

/// A single preprocessed item.
#[derive(Clone, Debug)]
pub struct InferenceItem {
    /// `[3, height, width]` `f32` values in `[0, 1]`.
    pub image: TensorData,
    pub idx: usize,
}

/// What a burn loader receives for one index: the item, or the error that
/// prevented building it. The error is shared so the value stays `Clone`.
pub type LoadedItem = std::result::Result<InferenceItem, Arc<DatasetError>>;

/// A read-only, indexable view over a list of filename keys.
///
/// Nothing is cached between calls, so one instance can be shared by any
/// number of loader workers.
#[derive(Clone, Debug)]
pub struct InferenceDataset<S> {
    data_path: PathBuf,
    filenames: Vec<String>,
    pipeline: ImagePipeline,
    source: S,
}

impl<S: ImageSource> InferenceDataset<S> {
    /// Creates a dataset rooted at `data_path`.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Config`] if `height` or `width` is zero or does not fit
    /// in `u32`, or if `filenames` is empty.
    pub fn new(
        data_path: impl Into<PathBuf>,
        filenames: Vec<String>,
        height: usize,
        width: usize,
        source: S,
    ) -> Result<Self> {
        if filenames.is_empty() {
            return Err(DatasetError::Config("no filenames given".into()));
        }

        let dim = |name: &str, v: usize| match u32::try_from(v) {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(DatasetError::Config(format!(
                "{name} must be a positive 32-bit size, got {v}"
            ))),
        };
        let pipeline = ImagePipeline::new(dim("height", height)?, dim("width", width)?);

        Ok(Self {
            data_path: data_path.into(),
            filenames,
            pipeline,
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn height(&self) -> usize {
        self.pipeline.height as usize
    }

    pub fn width(&self) -> usize {
        self.pipeline.width as usize
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The raw filename key of item `index`.
    pub fn key(&self, index: usize) -> Result<&str> {
        self.filenames
            .get(index)
            .map(String::as_str)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn source_path(&self, index: usize) -> Result<PathBuf> {
        self.source.source_path(&self.data_path, self.key(index)?)
    }

    /// Decodes the source image of item `index` at its native size.
    pub fn load_image(&self, index: usize) -> Result<DynamicImage> {
        self.source.load_image(&self.data_path, self.key(index)?)
    }

    /// Loads, resizes and converts item `index`.
    ///
    /// The image tensor always has shape `[3, height, width]`, whatever the
    /// native size of the source.
    pub fn get(&self, index: usize) -> Result<InferenceItem> {
        let image = self.load_image(index)?;
        Ok(InferenceItem {
            image: self.pipeline.apply(image),
            idx: index,
        })
    }

    pub fn output_location(&self, index: usize, savepath: &Path) -> Result<OutputLocation> {
        self.source
            .output_location(savepath, index, self.key(index)?)
    }

    /// Writes the prediction (and optional visualisation) of item `index` to
    /// the dataset-specific location under `savepath`.
    pub fn save_result(
        &self,
        index: usize,
        savepath: &Path,
        prediction: &TensorData,
        visualisation: Option<&RgbImage>,
        config: &SaveConfig,
    ) -> Result<SavedResult> {
        let location = self.output_location(index, savepath)?;
        save_result(&location.dir, &location.name, prediction, visualisation, config)
    }
}

impl<S: ImageSource> Dataset<LoadedItem> for InferenceDataset<S> {
    /// `None` past the end. Items that fail to load are logged and yielded
    /// as `Some(Err(_))`, so a burn loader still visits every later index.
    fn get(&self, index: usize) -> Option<LoadedItem> {
        match InferenceDataset::get(self, index) {
            Ok(item) => Some(Ok(item)),
            Err(DatasetError::IndexOutOfRange { .. }) => None,
            Err(e) => {
                error!(index, error = %e, "failed to load dataset item");
                Some(Err(Arc::new(e)))
            }
        }
    }

    fn len(&self) -> usize {
        self.filenames.len()
    }
}

/// Reads a split file with one filename key per line.
///
/// Trailing whitespace (including `\r`) is trimmed and blank lines skipped.
pub fn read_filenames(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transforms::pipeline::solid_image;

    /// Resolves every key to `<root>/<key>.png`, for exercising the base contract.
    #[derive(Debug)]
    pub(crate) struct FlatSource;

    impl ImageSource for FlatSource {
        fn source_path(&self, data_path: &Path, key: &str) -> Result<PathBuf> {
            Ok(data_path.join(format!("{key}.png")))
        }

        fn output_location(
            &self,
            savepath: &Path,
            index: usize,
            _key: &str,
        ) -> Result<OutputLocation> {
            Ok(OutputLocation {
                dir: savepath.to_path_buf(),
                name: index.to_string(),
            })
        }
    }

    pub(crate) fn flat_dataset(root: &Path, sizes: &[(u32, u32)]) -> InferenceDataset<FlatSource> {
        let mut keys = vec![];
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let key = format!("img{i}");
            solid_image(w, h, [i as u8 * 40, 90, 200])
                .save(root.join(format!("{key}.png")))
                .unwrap();
            keys.push(key);
        }
        InferenceDataset::new(root, keys, 12, 20, FlatSource).unwrap()
    }

    #[test]
    fn len_matches_key_count() {
        let dir = tempfile::tempdir().unwrap();
        let ds = flat_dataset(dir.path(), &[(5, 5), (7, 3), (64, 48)]);
        assert_eq!(ds.len(), 3);
        assert_eq!(Dataset::len(&ds), 3);
        assert!(!ds.is_empty());
    }

    #[test]
    fn every_item_has_the_configured_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ds = flat_dataset(dir.path(), &[(5, 5), (7, 3), (64, 48)]);

        for i in 0..ds.len() {
            let item = ds.get(i).unwrap();
            assert_eq!(item.idx, i);
            assert_eq!(item.image.shape, vec![3, 12, 20]);
        }
    }

    #[test]
    fn index_past_the_end_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ds = flat_dataset(dir.path(), &[(5, 5)]);

        assert!(matches!(
            ds.get(ds.len()),
            Err(DatasetError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(Dataset::get(&ds, 1).is_none());
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ds = InferenceDataset::new(dir.path(), vec!["ghost".into()], 4, 4, FlatSource).unwrap();

        match ds.get(0) {
            Err(DatasetError::NotFound { path }) => assert_eq!(path, dir.path().join("ghost.png")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn burn_view_reports_failures_as_items() {
        let dir = tempfile::tempdir().unwrap();
        let ds = flat_dataset(dir.path(), &[(5, 5), (6, 6)]);
        fs::remove_file(dir.path().join("img0.png")).unwrap();

        match Dataset::get(&ds, 0) {
            Some(Err(e)) => assert!(matches!(*e, DatasetError::NotFound { .. })),
            other => panic!("expected a failed item, got {other:?}"),
        }
        assert_eq!(Dataset::get(&ds, 1).unwrap().unwrap().idx, 1);
        assert!(Dataset::get(&ds, 2).is_none());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let keys = || vec!["a".to_string()];
        assert!(matches!(
            InferenceDataset::new("/data", keys(), 0, 10, FlatSource),
            Err(DatasetError::Config(_))
        ));
        assert!(matches!(
            InferenceDataset::new("/data", keys(), 10, 0, FlatSource),
            Err(DatasetError::Config(_))
        ));
        assert!(matches!(
            InferenceDataset::new("/data", vec![], 10, 10, FlatSource),
            Err(DatasetError::Config(_))
        ));
    }

    #[test]
    fn concurrent_reads_see_the_same_items() {
        let dir = tempfile::tempdir().unwrap();
        let ds = flat_dataset(dir.path(), &[(9, 9), (3, 8)]);
        let pixels = |i| ds.get(i).unwrap().image.to_vec::<f32>().unwrap();
        let expected = pixels(1);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| pixels(1))).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn split_files_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_files.txt");
        fs::write(&path, "seq 1 l\r\nseq 2 r\n\n").unwrap();

        assert_eq!(read_filenames(&path).unwrap(), vec!["seq 1 l", "seq 2 r"]);
    }
}
