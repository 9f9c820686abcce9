use std::path::{Path, PathBuf};

use super::{ImageSource, OutputLocation};
use crate::error::Result;
use crate::keys::MatterportKey;

const COLOR_DIR: &str = "matterport_color_images";

/// Matterport skybox layout:
///
/// `<data_path>/<scan>/<scan>/matterport_color_images/<position>_i<height>_<direction>.jpg`
///
/// Results go to `<savepath>/<scan>/<position>_<height>_<direction>.npy`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatterportSource;

impl ImageSource for MatterportSource {
    fn source_path(&self, data_path: &Path, key: &str) -> Result<PathBuf> {
        let key = MatterportKey::parse(key)?;
        Ok(data_path
            .join(key.scan)
            .join(key.scan)
            .join(COLOR_DIR)
            .join(key.image_file()))
    }

    fn output_location(&self, savepath: &Path, _index: usize, key: &str) -> Result<OutputLocation> {
        let key = MatterportKey::parse(key)?;
        Ok(OutputLocation {
            dir: savepath.join(key.scan),
            name: key.result_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::InferenceDataset;
    use crate::error::DatasetError;
    use crate::npy::read_f16;
    use crate::persist::SaveConfig;
    use crate::transforms::pipeline::solid_image;
    use burn::tensor::TensorData;
    use std::fs;

    #[test]
    fn resolves_colour_image_path() {
        let path = MatterportSource
            .source_path(Path::new("/mp"), "scanA pos1 1 north")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/mp/scanA/scanA/matterport_color_images/pos1_i1_north.jpg")
        );
    }

    #[test]
    fn output_goes_to_scan_subdirectory() {
        let loc = MatterportSource
            .output_location(Path::new("/save"), 99, "scanA pos1 1 north")
            .unwrap();
        assert_eq!(loc.dir, PathBuf::from("/save/scanA"));
        assert_eq!(loc.name, "pos1_1_north");
        assert_eq!(loc.npy_path(), PathBuf::from("/save/scanA/pos1_1_north.npy"));
    }

    #[test]
    fn malformed_key_fails_on_save_as_well() {
        assert!(matches!(
            MatterportSource.output_location(Path::new("/save"), 0, "scanA pos1 1"),
            Err(DatasetError::Parse { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn saves_into_existing_scan_directory() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let colour = root.path().join("scanA/scanA").join(COLOR_DIR);
        fs::create_dir_all(&colour).unwrap();
        solid_image(64, 48, [50, 60, 70])
            .save(colour.join("pos1_i1_north.jpg"))
            .unwrap();
        fs::create_dir_all(out.path().join("scanA")).unwrap();

        let ds = InferenceDataset::new(
            root.path(),
            vec!["scanA pos1 1 north".into()],
            16,
            32,
            MatterportSource,
        )
        .unwrap();

        let item = ds.get(0).unwrap();
        assert_eq!(item.image.shape, vec![3, 16, 32]);

        let prediction = TensorData::new(vec![1.5f32, 2.5], [2]);
        let config = SaveConfig::new();
        ds.save_result(0, out.path(), &prediction, None, &config).unwrap();
        ds.save_result(0, out.path(), &prediction, None, &config).unwrap();

        let npy = out.path().join("scanA/pos1_1_north.npy");
        let (shape, values) = read_f16(&npy).unwrap();
        assert_eq!(shape, vec![2]);
        assert_eq!(values[1].to_f32(), 2.5);
        assert_eq!(fs::read_dir(out.path().join("scanA")).unwrap().count(), 1);
    }
}
