// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use serde_json::Value;

use crate::constant;
use crate::error::SorrelError;
use crate::io::{numeric_column, read_table};

/// A single point prompt in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPrompt {
    pub row: f32,
    pub col: f32,
    pub positive: bool,
}

impl PointPrompt {
    /// A positive prompt at (row, col)
    pub fn positive(row: f32, col: f32) -> Self {
        PointPrompt {
            row,
            col,
            positive: true,
        }
    }

    /// A negative prompt at (row, col)
    pub fn negative(row: f32, col: f32) -> Self {
        PointPrompt {
            row,
            col,
            positive: false,
        }
    }

    /// The same prompt translated so that (row, col) is relative to an origin
    pub fn shifted(&self, origin_row: u32, origin_col: u32) -> Self {
        PointPrompt {
            row: self.row - origin_row as f32,
            col: self.col - origin_col as f32,
            positive: self.positive,
        }
    }
}

/// An ordered collection of point prompts for a single image
///
/// # Examples
///
/// ```
/// use sorrel_core::im::{PointPrompt, Points};
///
/// let points = Points::new(vec![PointPrompt::positive(2.0, 3.0)]);
///
/// assert!(points.validate(4, 4).is_ok());
/// assert!(points.validate(2, 4).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points {
    points: Vec<PointPrompt>,
}

impl Points {
    pub fn new(points: Vec<PointPrompt>) -> Self {
        Points { points }
    }

    /// Open point prompts from a delimited table (.csv, .tsv, .txt) or .json file
    ///
    /// Tables need a row column (`y`, `row` or `axis-0`) and a column column
    /// (`x`, `col`, `column` or `axis-1`). An optional `label` column marks
    /// negative prompts with 0. JSON files hold `[[row, col], ...]` either as
    /// a bare array or under a `points`, `prompts`, `coordinates` or `yx` key,
    /// with an optional third label entry per point.
    ///
    /// ```no_run
    /// use sorrel_core::im::Points;
    /// let points = Points::open("image.csv");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Points, SorrelError> {
        if !path.as_ref().exists() {
            return Err(SorrelError::NoFileError(path.as_ref().display().to_string()));
        }

        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("json") => Self::open_json(path),
            Some(ext) if constant::SUPPORTED_POINT_FORMATS.contains(&ext) => Self::open_table(path),
            _ => Err(SorrelError::PointsReadError(format!(
                "Unsupported extension for {}. Must be one of: {:?}",
                path.as_ref().display(),
                constant::SUPPORTED_POINT_FORMATS
            ))),
        }
    }

    fn open_table<P: AsRef<Path>>(path: P) -> Result<Points, SorrelError> {
        let df = read_table(path)?;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let find = |keys: &[&str]| {
            keys.iter()
                .find(|key| names.iter().any(|name| name == *key))
                .map(|key| key.to_string())
        };

        let row_key = find(&constant::POINT_ROW_KEYS).ok_or_else(|| {
            SorrelError::PointsFormatError(format!(
                "No row column found. Expected one of {:?}",
                constant::POINT_ROW_KEYS
            ))
        })?;

        let col_key = find(&constant::POINT_COL_KEYS).ok_or_else(|| {
            SorrelError::PointsFormatError(format!(
                "No column column found. Expected one of {:?}",
                constant::POINT_COL_KEYS
            ))
        })?;

        let rows = numeric_column(&df, &row_key)?;
        let cols = numeric_column(&df, &col_key)?;

        let labels = if find(&[constant::POINT_LABEL_KEY]).is_some() {
            numeric_column(&df, constant::POINT_LABEL_KEY)?
        } else {
            vec![1.0; rows.len()]
        };

        Ok(Points::new(
            rows.into_iter()
                .zip(cols)
                .zip(labels)
                .map(|((row, col), label)| PointPrompt {
                    row,
                    col,
                    positive: label != 0.0,
                })
                .collect(),
        ))
    }

    fn open_json<P: AsRef<Path>>(path: P) -> Result<Points, SorrelError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|err| SorrelError::PointsReadError(err.to_string()))?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|err| SorrelError::PointsReadError(err.to_string()))?;

        Self::new_from_json(&value)
    }

    /// Parse point prompts from a JSON value
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use sorrel_core::im::Points;
    ///
    /// let points = Points::new_from_json(&json!({"points": [[1, 2], [3, 4, 0]]})).unwrap();
    ///
    /// assert_eq!(points.len(), 2);
    /// assert!(!points.as_slice()[1].positive);
    /// ```
    pub fn new_from_json(value: &Value) -> Result<Points, SorrelError> {
        let array = match value {
            Value::Array(array) => array,
            Value::Object(map) => constant::POINT_JSON_VALID_KEYS
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(|v| v.as_array())
                .ok_or_else(|| {
                    SorrelError::PointsFormatError(format!(
                        "JSON object must contain a point array under one of {:?}",
                        constant::POINT_JSON_VALID_KEYS
                    ))
                })?,
            _ => {
                return Err(SorrelError::PointsFormatError(
                    "JSON points must be an array or an object".to_string(),
                ));
            }
        };

        let points = array
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let values: Option<Vec<f64>> = entry
                    .as_array()
                    .map(|coords| coords.iter().map(|c| c.as_f64()).collect())
                    .unwrap_or(None);

                match values.as_deref() {
                    Some([row, col]) => Ok(PointPrompt::positive(*row as f32, *col as f32)),
                    Some([row, col, label]) => Ok(PointPrompt {
                        row: *row as f32,
                        col: *col as f32,
                        positive: *label != 0.0,
                    }),
                    _ => Err(SorrelError::PointsFormatError(format!(
                        "Point {} must be a [row, col] or [row, col, label] array of numbers",
                        idx
                    ))),
                }
            })
            .collect::<Result<Vec<PointPrompt>, SorrelError>>()?;

        Ok(Points::new(points))
    }

    /// Check that every point lies inside an image of the provided size
    pub fn validate(&self, height: u32, width: u32) -> Result<(), SorrelError> {
        for point in self.points.iter() {
            let inside = point.row >= 0.0
                && point.col >= 0.0
                && point.row < height as f32
                && point.col < width as f32;

            if !inside {
                return Err(SorrelError::PointBoundsError {
                    row: point.row,
                    col: point.col,
                    height,
                    width,
                });
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointPrompt> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[PointPrompt] {
        &self.points
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use serde_json::json;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("sorrel_points_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_open_csv_xy() {
        let path = write_temp("xy.csv", "x,y\n10,20\n30.5,40\n");
        let points = Points::open(&path).unwrap();

        assert_eq!(
            points.as_slice(),
            &[
                PointPrompt::positive(20.0, 10.0),
                PointPrompt::positive(40.0, 30.5)
            ]
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_csv_napari_with_labels() {
        let path = write_temp(
            "napari.csv",
            "index,axis-0,axis-1,label\n0,5,6,1\n1,7,8,0\n",
        );
        let points = Points::open(&path).unwrap();

        assert_eq!(
            points.as_slice(),
            &[PointPrompt::positive(5.0, 6.0), PointPrompt::negative(7.0, 8.0)]
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_tsv() {
        let path = write_temp("rows.tsv", "row\tcol\n1\t2\n");
        let points = Points::open(&path).unwrap();

        assert_eq!(points.as_slice(), &[PointPrompt::positive(1.0, 2.0)]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_csv_missing_column() {
        let path = write_temp("missing.csv", "x,z\n1,2\n");
        let result = Points::open(&path);

        assert!(matches!(result, Err(SorrelError::PointsFormatError(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_json() {
        let path = write_temp("points.json", "{\"yx\": [[1.5, 2.5], [3, 4]]}");
        let points = Points::open(&path).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points.as_slice()[0], PointPrompt::positive(1.5, 2.5));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_malformed_point() {
        let result = Points::new_from_json(&json!([[1, 2], [3]]));
        assert!(matches!(result, Err(SorrelError::PointsFormatError(_))));

        let result = Points::new_from_json(&json!({"boxes": [[1, 2]]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let result = Points::open("does_not_exist.csv");
        assert!(matches!(result, Err(SorrelError::NoFileError(_))));
    }

    #[test]
    fn test_validate_bounds() {
        let points = Points::new(vec![PointPrompt::positive(0.0, 9.5)]);

        assert!(points.validate(1, 10).is_ok());
        assert!(points.validate(1, 9).is_err());

        let negative = Points::new(vec![PointPrompt::positive(-1.0, 0.0)]);
        assert!(negative.validate(10, 10).is_err());
    }

    #[test]
    fn test_shifted() {
        let point = PointPrompt::negative(10.0, 20.0).shifted(4, 5);
        assert_eq!(point, PointPrompt::negative(6.0, 15.0));
    }
}
