// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

use sorrel_core::im::{BinaryMask, LabelImage, SorrelImage};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sorrel_cli_{}_{}", std::process::id(), name));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn square(size: u32, row: u32, col: u32, side: u32) -> BinaryMask {
    let mut data = vec![0u8; (size * size) as usize];
    for r in row..row + side {
        for c in col..col + side {
            data[(r * size + c) as usize] = 1;
        }
    }

    BinaryMask::new(size, size, 1, data).unwrap()
}

#[test]
fn test_help() {
    Command::cargo_bin("sorrel")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("segment"));
}

#[test]
fn test_download_weights_list() {
    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["download", "weights", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sam_vit_b"))
        .stdout(predicate::str::contains("sam_vit_t"));
}

#[test]
fn test_download_weights_unknown() {
    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["download", "weights", "-n", "unet"])
        .assert()
        .failure();
}

#[test]
fn test_utils_composite_directory() {
    let root = temp_dir("composite");
    let masks = root.join("masks");
    std::fs::create_dir_all(&masks).unwrap();

    square(6, 0, 0, 2).save(masks.join("a_mask.png")).unwrap();
    square(6, 0, 0, 4).save(masks.join("b_mask.png")).unwrap();
    BinaryMask::zeros(6, 6, 1).save(masks.join("c_mask.png")).unwrap();

    let output = root.join("labels.npy");

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["utils", "composite", "-i"])
        .arg(&masks)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("empty"));

    let labels = LabelImage::open(&output).unwrap();

    assert_eq!(labels.max_label(), 2);
    assert_eq!(labels.as_raw()[0], 2);
    assert_eq!(labels.as_raw()[3], 1);
    assert_eq!(labels.as_raw()[5], 0);
    assert_eq!(labels.pixel_counts(2), vec![20, 12, 4]);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_utils_composite_output_inside_mask_directory() {
    let root = temp_dir("composite_inside");
    let masks = root.join("masks");
    std::fs::create_dir_all(&masks).unwrap();

    square(6, 0, 0, 2).save(masks.join("a.png")).unwrap();
    square(6, 3, 3, 3).save(masks.join("b.png")).unwrap();

    let output = masks.join("labels.tif");

    for _ in 0..2 {
        Command::cargo_bin("sorrel")
            .unwrap()
            .args(["utils", "composite", "-i"])
            .arg(&masks)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
    }

    let labels = LabelImage::open(&output).unwrap();
    assert_eq!(labels.labels(), vec![1, 2]);
    assert_eq!(labels.pixel_counts(2), vec![23, 9, 4]);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_utils_composite_strict_empty() {
    let root = temp_dir("composite_strict");
    let masks = root.join("masks");
    std::fs::create_dir_all(&masks).unwrap();

    square(4, 1, 1, 2).save(masks.join("a.png")).unwrap();
    BinaryMask::zeros(4, 4, 1).save(masks.join("b.png")).unwrap();

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["utils", "composite", "--strict", "-i"])
        .arg(&masks)
        .arg("-o")
        .arg(root.join("labels.tif"))
        .assert()
        .failure();

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_utils_composite_nested_directories() {
    let root = temp_dir("composite_nested");
    let input = root.join("input");

    for (name, side) in [("image_0", 2), ("image_1", 3)] {
        let masks = input.join(name);
        std::fs::create_dir_all(&masks).unwrap();
        square(5, 1, 1, side).save(masks.join("mask_0.png")).unwrap();
        square(5, 0, 0, 1).save(masks.join("mask_1.png")).unwrap();
    }

    let output = root.join("labels");

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["utils", "composite", "--format", "png", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    for name in ["image_0", "image_1"] {
        let labels = LabelImage::open(output.join(format!("{}_labels.png", name))).unwrap();
        assert_eq!(labels.labels(), vec![1, 2]);
    }

    let counts = std::fs::read_to_string(output.join("object_counts.tsv")).unwrap();
    assert_eq!(counts, "image_0\t2\nimage_1\t2");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_utils_composite_missing_input() {
    Command::cargo_bin("sorrel")
        .unwrap()
        .args([
            "utils",
            "composite",
            "-i",
            "does_not_exist",
            "-o",
            "labels.tif",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR"));
}

#[test]
fn test_utils_overlay() {
    let root = temp_dir("overlay");

    square(8, 2, 2, 4).save(root.join("image.png")).unwrap();

    let mut data = vec![0u32; 64];
    for r in 2..6 {
        for c in 2..6 {
            data[r * 8 + c] = 1;
        }
    }
    LabelImage::new(8, 8, 1, data)
        .unwrap()
        .save(root.join("labels.png"))
        .unwrap();

    std::fs::write(root.join("points.csv"), "y,x\n3,3\n").unwrap();

    let output = root.join("overlay.png");

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["utils", "overlay", "-i"])
        .arg(root.join("image.png"))
        .arg("-l")
        .arg(root.join("labels.png"))
        .arg("-p")
        .arg(root.join("points.csv"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let overlay = SorrelImage::open(&output).unwrap();
    assert_eq!(overlay.shape(), (8, 8, 3));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_utils_overlay_shape_mismatch() {
    let root = temp_dir("overlay_mismatch");

    square(8, 2, 2, 4).save(root.join("image.png")).unwrap();
    LabelImage::zeros(4, 4, 1).save(root.join("labels.png")).unwrap();

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["utils", "overlay", "-i"])
        .arg(root.join("image.png"))
        .arg("-l")
        .arg(root.join("labels.png"))
        .arg("-o")
        .arg(root.join("overlay.png"))
        .assert()
        .failure();

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_segment_points_invalid_model() {
    let root = temp_dir("segment_model");

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["segment", "points", "-m", "unet", "-i"])
        .arg(&root)
        .arg("-p")
        .arg(&root)
        .arg("-o")
        .arg(root.join("output"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_segment_points_invalid_tile_shape() {
    let root = temp_dir("segment_tile");

    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["segment", "points", "--tile-shape", "0,abc", "-i"])
        .arg(&root)
        .arg("-p")
        .arg(&root)
        .arg("-o")
        .arg(root.join("output"))
        .assert()
        .failure();

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_segment_points_help_lists_weights_options() {
    Command::cargo_bin("sorrel")
        .unwrap()
        .args(["segment", "points", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vit_b_lm"))
        .stdout(predicate::str::contains("--no-strict"))
        .stdout(predicate::str::contains("--no-overlay"));
}
