//! NumPy `.npy` files of half-precision predictions.
//!
//! Files are written through `npyz` as `<f2` arrays in C order, which numpy
//! loads directly with `np.load`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use half::f16;
use npyz::{NpyFile, Order, WriteOptions, WriterBuilder};

use crate::error::{DatasetError, Result};

/// Number of elements of an array of `shape`, or `None` on overflow.
fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Writes `values`, laid out in C order with the given `shape`, to `path`.
/// An existing file is replaced.
pub fn write_f16(path: &Path, shape: &[usize], values: &[f16]) -> Result<()> {
    match element_count(shape) {
        Some(expected) if expected == values.len() => {}
        expected => {
            return Err(DatasetError::Data(format!(
                "shape {shape:?} needs {expected:?} values, got {}",
                values.len()
            )));
        }
    }

    let dims: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut out = BufWriter::new(file);

    let mut writer = WriteOptions::<f16>::new()
        .default_dtype()
        .shape(&dims)
        .writer(&mut out)
        .begin_nd()
        .map_err(|e| DatasetError::io(path, e))?;
    writer
        .extend(values.iter().copied())
        .map_err(|e| DatasetError::io(path, e))?;
    writer.finish().map_err(|e| DatasetError::io(path, e))?;

    out.flush().map_err(|e| DatasetError::io(path, e))
}

/// Reads a `<f2` C-order array written by [`write_f16`] (or by numpy).
pub fn read_f16(path: &Path) -> Result<(Vec<usize>, Vec<f16>)> {
    let malformed = |reason: String| DatasetError::Npy {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let npy = NpyFile::new(BufReader::new(file)).map_err(|e| malformed(e.to_string()))?;

    if matches!(npy.order(), Order::Fortran) {
        return Err(malformed("fortran-ordered arrays are not supported".into()));
    }

    let shape = npy
        .shape()
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| malformed(format!("dimension {d} too large"))))
        .collect::<Result<Vec<_>>>()?;
    element_count(&shape).ok_or_else(|| malformed(format!("shape {shape:?} overflows")))?;

    let values = npy
        .into_vec::<f16>()
        .map_err(|e| malformed(e.to_string()))?;
    Ok((shape, values))
}
