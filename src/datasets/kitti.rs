use std::path::{Path, PathBuf};

use super::{ImageSource, OutputLocation};
use crate::error::Result;
use crate::keys::KittiKey;

/// Raw KITTI drive layout:
///
/// `<data_path>/<sequence>/<image_02|image_03>/data/<frame:0>10>.<ext>`
///
/// Results are written flat into the save directory, named after the item
/// index (`007.npy`), since every item of a KITTI split shares one output
/// folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KittiSource {
    pub image_ext: String,
}

impl Default for KittiSource {
    fn default() -> Self {
        Self {
            image_ext: "jpg".to_string(),
        }
    }
}

impl KittiSource {
    pub fn new(image_ext: impl Into<String>) -> Self {
        Self {
            image_ext: image_ext.into(),
        }
    }
}

impl ImageSource for KittiSource {
    fn source_path(&self, data_path: &Path, key: &str) -> Result<PathBuf> {
        let key = KittiKey::parse(key)?;
        Ok(data_path
            .join(key.sequence)
            .join(key.side.camera_dir())
            .join("data")
            .join(format!("{}.{}", key.padded_frame(), self.image_ext)))
    }

    fn output_location(&self, savepath: &Path, index: usize, key: &str) -> Result<OutputLocation> {
        // Keys are still validated so a malformed split fails the same way on save.
        KittiKey::parse(key)?;
        Ok(OutputLocation {
            dir: savepath.to_path_buf(),
            name: format!("{index:0>3}"),
        })
    }
}
