// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use npyz::{self, WriterBuilder};

use crate::error::SorrelError;

/// Write a numpy file from a vector of specified shape
///
/// # Arguments
///
/// * `path` - Path to output numpy file
/// * `data` - Vector of numeric type
/// * `shape` - Shape of the vector (shape product must equal length of data)
///
/// # Examples
///
/// ```no_run
/// use sorrel_core::io::write_numpy;
///
/// write_numpy("labels.npy", vec![0u32, 1, 1, 2], vec![2, 2]).unwrap();
/// ```
pub fn write_numpy<T, P: AsRef<Path>>(
    path: P,
    data: Vec<T>,
    shape: Vec<u64>,
) -> Result<(), SorrelError>
where
    T: npyz::Serialize + npyz::AutoSerialize,
{
    if shape.iter().product::<u64>() != data.len() as u64 {
        return Err(SorrelError::BufferSizeError);
    }

    let mut buffer = vec![];
    let mut writer = npyz::WriteOptions::<T>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buffer)
        .begin_nd()
        .map_err(|_| SorrelError::ImageWriteError)?;

    for d in data.iter() {
        writer.push(d).map_err(|_| SorrelError::ImageWriteError)?;
    }

    writer.finish().map_err(|_| SorrelError::ImageWriteError)?;
    std::fs::write(path, buffer).map_err(|_| SorrelError::ImageWriteError)?;
    Ok(())
}
