// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::SorrelError;

/// Create a new directory, adding an incrementing suffix if it already exists
///
/// # Arguments
///
/// * `directory` - Path to new directory
///
/// # Examples
///
/// ```
/// use sorrel_core::ut::path::create_directory;
///
/// let base = std::env::temp_dir().join("SORREL_CREATE_DIRECTORY");
/// let _ = std::fs::remove_dir(&base);
/// let _ = std::fs::remove_dir(std::env::temp_dir().join("SORREL_CREATE_DIRECTORY_0"));
///
/// let first = create_directory(&base).unwrap();
/// let second = create_directory(&base).unwrap();
///
/// assert_eq!(first, base);
/// assert!(second.ends_with("SORREL_CREATE_DIRECTORY_0"));
///
/// std::fs::remove_dir(first).unwrap();
/// std::fs::remove_dir(second).unwrap();
/// ```
pub fn create_directory<P: AsRef<Path>>(directory: P) -> Result<PathBuf, SorrelError> {
    let directory = directory.as_ref();

    if !directory.exists() {
        std::fs::create_dir_all(directory).map_err(|err| SorrelError::DirError(err.to_string()))?;
        return Ok(directory.to_path_buf());
    }

    let parent = directory.parent().unwrap_or_else(|| Path::new("."));
    let base_name = directory
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SorrelError::DirError("Invalid directory name".to_string()))?;

    for index in 0..30 {
        let new_dir = parent.join(format!("{}_{}", base_name, index));

        if !new_dir.exists() {
            std::fs::create_dir(&new_dir).map_err(|err| SorrelError::DirError(err.to_string()))?;
            return Ok(new_dir);
        }
    }

    Err(SorrelError::DirError(format!(
        "Could not create a directory in alotted increments. Check the directory path: {}",
        directory.display()
    )))
}

/// Collect sorted file paths from a directory with an optional substring filter
///
/// # Arguments
///
/// * `directory` - Path to directory containing files
/// * `valid_ext` - Lowercase file extensions to keep
/// * `substring` - Only include files containing this substring
///
/// # Examples
///
/// ```no_run
/// use sorrel_core::ut::path::collect_file_paths;
/// use sorrel_core::constant::SUPPORTED_IMAGE_FORMATS;
/// let files = collect_file_paths("directory/", SUPPORTED_IMAGE_FORMATS.as_slice(), None);
/// ```
pub fn collect_file_paths<P: AsRef<Path>>(
    directory: P,
    valid_ext: &[&str],
    substring: Option<String>,
) -> Result<Vec<PathBuf>, SorrelError> {
    let message = directory.as_ref().display().to_string();

    let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|_| SorrelError::DirError(message))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| valid_ext.contains(&ext.to_lowercase().as_str()))
        })
        .collect();

    if let Some(substring) = substring {
        files.retain(|f| {
            f.file_name()
                .is_some_and(|name| name.to_string_lossy().contains(&substring))
        });
    }

    files.sort();

    Ok(files)
}

/// File stem with an optional identifying substring removed
///
/// ```
/// use std::path::Path;
/// use sorrel_core::ut::path::file_id;
///
/// assert_eq!(file_id(Path::new("a/img_1_points.csv"), Some("_points")), "img_1");
/// assert_eq!(file_id(Path::new("a/img_1.png"), None), "img_1");
/// ```
pub fn file_id(path: &Path, substring: Option<&str>) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    match substring {
        Some(substring) if !substring.is_empty() => stem.replace(substring, ""),
        _ => stem,
    }
}

/// Collect file pairs that share a matching identifier, sorted by identifier
///
/// # Arguments
///
/// * `files_a` - List of file paths
/// * `files_b` - List of file paths
/// * `substring_a` - Optionally remove a substring from the first set of file stems
/// * `substring_b` - Optionally remove a substring from the second set of file stems
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use sorrel_core::ut::path::collect_file_pairs;
///
/// let images: [PathBuf; 3] = [
///     PathBuf::from("directory/id_1.png"),
///     PathBuf::from("directory/id_2.png"),
///     PathBuf::from("directory/id_3.png"),
/// ];
///
/// let points: [PathBuf; 3] = [
///     PathBuf::from("directory/id_1_points.csv"),
///     PathBuf::from("directory/id_2_points.csv"),
///     PathBuf::from("directory/id_4_points.csv"),
/// ];
///
/// let pairs = collect_file_pairs(&images, &points, None, None);
/// assert_eq!(pairs.len(), 0);
///
/// let pairs = collect_file_pairs(&images, &points, None, Some("_points".to_string()));
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs[0].0, "id_1");
/// ```
pub fn collect_file_pairs(
    files_a: &[PathBuf],
    files_b: &[PathBuf],
    substring_a: Option<String>,
    substring_b: Option<String>,
) -> Vec<(String, PathBuf, PathBuf)> {
    let file_map: HashMap<String, &PathBuf> = files_a
        .iter()
        .map(|file| (file_id(file, substring_a.as_deref()), file))
        .collect();

    let mut pairs: Vec<(String, PathBuf, PathBuf)> = files_b
        .par_iter()
        .filter_map(|file_b| {
            let name = file_id(file_b, substring_b.as_deref());
            file_map
                .get(&name)
                .map(|file_a| (name, (*file_a).clone(), file_b.clone()))
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    pairs
}
