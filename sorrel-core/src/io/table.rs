// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::SorrelError;

/// Write a table to a delimited text file
///
/// # Arguments
///
/// * `df` - A DataFrame
/// * `path` - Path to the output file
/// * `separator` - Field separator (e.g. b',' or b'\t')
fn write_table_delimited<P: AsRef<Path>>(
    df: &mut DataFrame,
    path: P,
    separator: u8,
) -> Result<(), SorrelError> {
    let mut output: File = File::create(&path).map_err(|_| {
        SorrelError::TableWriteError(format!(
            "Failed to create file: {}",
            path.as_ref().display()
        ))
    })?;

    CsvWriter::new(&mut output)
        .include_header(true)
        .with_separator(separator)
        .finish(df)
        .map_err(|err| SorrelError::TableWriteError(err.to_string()))
}

/// Write a table to a parquet file
///
/// # Arguments
///
/// * `df` - A DataFrame
/// * `path` - Path to the output file
pub fn write_table_pq<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<(), SorrelError> {
    let mut output: File = File::create(&path).map_err(|_| {
        SorrelError::TableWriteError(format!(
            "Failed to create parquet file: {}",
            path.as_ref().display()
        ))
    })?;

    ParquetWriter::new(&mut output)
        .finish(df)
        .map(|_| ())
        .map_err(|err| SorrelError::TableWriteError(err.to_string()))
}

/// Write a DataFrame to disk with the format chosen by extension
///
/// # Arguments
///
/// * `df` - A DataFrame
/// * `path` - Path ending in .csv, .tsv, .txt, .parquet or .pq
///
/// # Examples
///
/// ```no_run
/// use polars::prelude::*;
/// use sorrel_core::io::write_table;
///
/// let column = vec![Column::new("area".into(), [25u32, 31, 34])];
/// let mut df: DataFrame = DataFrame::new(column).unwrap();
///
/// write_table(&mut df, "objects.csv").unwrap()
/// ```
pub fn write_table<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<(), SorrelError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("csv") => write_table_delimited(df, path, b','),
        Some("tsv") | Some("txt") => write_table_delimited(df, path, b'\t'),
        Some("parquet") | Some("pq") => write_table_pq(df, path),
        _ => Err(SorrelError::TableWriteError(
            "Provided table path has an invalid extension. Must be one of: csv, tsv, txt, parquet, or pq".to_string(),
        )),
    }
}

/// Read a delimited text table with a header row
///
/// Files ending in .tsv or .txt are read as tab-separated, anything else as
/// comma-separated.
///
/// # Arguments
///
/// * `path` - Path to the table
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<DataFrame, SorrelError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let separator = match extension.as_deref() {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    };

    CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|err| SorrelError::PointsReadError(err.to_string()))
}

/// Extract a numeric column from a table as f32 values
///
/// # Arguments
///
/// * `df` - A DataFrame
/// * `name` - Column name
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f32>, SorrelError> {
    let series = df
        .column(name)
        .map_err(|err| SorrelError::PointsFormatError(err.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|err| SorrelError::PointsFormatError(err.to_string()))?;

    let values = series
        .f64()
        .map_err(|err| SorrelError::PointsFormatError(err.to_string()))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(|v| v as f32).ok_or_else(|| {
                SorrelError::PointsFormatError(format!(
                    "Missing value in column '{}' at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sorrel_table_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_write_read_csv() {
        let path = temp_path("roundtrip.csv");
        let mut df = DataFrame::new(vec![
            Column::new("y".into(), [1.5f64, 2.0]),
            Column::new("x".into(), [3i64, 4]),
        ])
        .unwrap();

        write_table(&mut df, &path).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(numeric_column(&table, "y").unwrap(), vec![1.5, 2.0]);
        assert_eq!(numeric_column(&table, "x").unwrap(), vec![3.0, 4.0]);
        assert!(numeric_column(&table, "z").is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_read_tsv() {
        let path = temp_path("roundtrip.tsv");
        let mut df = DataFrame::new(vec![Column::new("row".into(), [7u32, 8, 9])]).unwrap();

        write_table(&mut df, &path).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(numeric_column(&table, "row").unwrap(), vec![7.0, 8.0, 9.0]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_invalid_extension() {
        let mut df = DataFrame::new(vec![Column::new("a".into(), [1u32])]).unwrap();
        assert!(write_table(&mut df, temp_path("table.xlsx")).is_err());
    }
}
