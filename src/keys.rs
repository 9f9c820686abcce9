//! Parsing of the space-delimited filename keys found in split files.
//!
//! Keys are parsed on every access and never cached, so a dataset only ever
//! stores the raw strings.

use crate::error::{DatasetError, Result};

/// Splits `key` on single spaces into exactly `N` fields.
fn split_fields<const N: usize>(key: &str) -> Result<[&str; N]> {
    let fields: Vec<&str> = key.split(' ').collect();

    fields.as_slice().try_into().map_err(|_| DatasetError::Parse {
        key: key.to_string(),
        expected: N,
        found: fields.len(),
    })
}

/// Stereo camera a KITTI frame was captured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Anything other than `l` is treated as the right camera.
    pub fn from_token(token: &str) -> Self {
        if token == "l" { Side::Left } else { Side::Right }
    }

    /// Name of the raw KITTI directory holding this camera's colour images.
    pub fn camera_dir(&self) -> &'static str {
        match self {
            Side::Left => "image_02",
            Side::Right => "image_03",
        }
    }
}

/// `"<sequence> <frame> <side>"`, e.g. `"2011_09_26_drive_0001_sync 45 l"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KittiKey<'a> {
    pub sequence: &'a str,
    pub frame: &'a str,
    pub side: Side,
}

impl<'a> KittiKey<'a> {
    pub fn parse(key: &'a str) -> Result<Self> {
        let [sequence, frame, side] = split_fields::<3>(key)?;
        Ok(KittiKey {
            sequence,
            frame,
            side: Side::from_token(side),
        })
    }

    /// Frame number left-padded with zeros to the 10 digits KITTI uses.
    pub fn padded_frame(&self) -> String {
        format!("{:0>10}", self.frame)
    }
}

/// `"<scan> <position> <height> <direction>"`, e.g. `"scanA pos1 1 north"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatterportKey<'a> {
    pub scan: &'a str,
    pub position: &'a str,
    pub height: &'a str,
    pub direction: &'a str,
}

impl<'a> MatterportKey<'a> {
    pub fn parse(key: &'a str) -> Result<Self> {
        let [scan, position, height, direction] = split_fields::<4>(key)?;
        Ok(MatterportKey {
            scan,
            position,
            height,
            direction,
        })
    }

    /// File name of the source colour image, e.g. `pos1_i1_north.jpg`.
    pub fn image_file(&self) -> String {
        format!("{}_i{}_{}.jpg", self.position, self.height, self.direction)
    }

    /// Leaf name used for results, e.g. `pos1_1_north`.
    pub fn result_name(&self) -> String {
        format!("{}_{}_{}", self.position, self.height, self.direction)
    }
}
