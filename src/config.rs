use burn::config::Config;
use serde::{Deserialize, Serialize};
use {argh::FromArgs, std::fmt::Debug};

use crate::persist::SaveConfig;

pub const LOG_PATH: &str = "./artifacts/log.txt";
pub const HEIGHT: usize = 192;
pub const WIDTH: usize = 640;

/// Directory layout of the images a split file refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Raw KITTI drives, keys `"<sequence> <frame> <l|r>"`.
    Kitti,
    /// Matterport skybox images, keys `"<scan> <position> <height> <direction>"`.
    Matterport,
}

/// Settings of the inference loop and of the files it writes.
#[derive(Config, Debug)]
pub struct RunConfig {
    #[config(default = 12)]
    pub batch_size: usize,
    /// Write a `.jpg` next to every `.npy`.
    #[config(default = true)]
    pub save_visualisation: bool,
    #[config(default = "SaveConfig::new()")]
    pub save: SaveConfig,
    #[config(default = "LOG_PATH.to_string()")]
    pub log_path: String,
}

/// Everything needed to build a dataset and run it, loadable from JSON.
///
/// ```json
/// {
///   "data_path": "/data/kitti_raw",
///   "split_file": "splits/kitti/test_files.txt",
///   "dataset": "Kitti",
///   "height": 192,
///   "width": 640
/// }
/// ```
#[derive(Config, Debug)]
pub struct InferenceConfig {
    pub data_path: String,
    /// Text file with one filename key per line.
    pub split_file: String,
    pub dataset: DatasetKind,
    #[config(default = "HEIGHT")]
    pub height: usize,
    #[config(default = "WIDTH")]
    pub width: usize,
    /// Extension of KITTI frames; ignored for Matterport.
    #[config(default = "String::from(\"jpg\")")]
    pub image_ext: String,
    #[config(default = "RunConfig::new()")]
    pub run: RunConfig,
}

#[derive(FromArgs, PartialEq, Debug)]
/// Top-level command.
pub struct FootprintsCmd {
    #[argh(subcommand)]
    pub commands: Commands,
    #[argh(option)]
    /// path of the JSON inference config
    pub config: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum Commands {
    Resolve(SubCommandResolve),
    Export(SubCommandExport),
}

#[derive(FromArgs, PartialEq, Debug)]
/// Print the source image and result path of every filename key
#[argh(subcommand, name = "resolve")]
pub struct SubCommandResolve {
    #[argh(option)]
    /// directory results would be saved to (default ./results)
    pub out: Option<String>,
}

#[derive(FromArgs, PartialEq, Debug)]
/// Preprocess every image and save the network inputs as results
#[argh(subcommand, name = "export")]
pub struct SubCommandExport {
    #[argh(option)]
    /// directory to save results to
    pub out: String,
    #[argh(option)]
    /// override the batch size from the config file
    pub b: Option<usize>,
}
