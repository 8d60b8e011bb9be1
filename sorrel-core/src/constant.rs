// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// All currently supported image formats
pub const SUPPORTED_IMAGE_FORMATS: [&str; 18] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp", "npy",
];

// The currently supported common image formats
pub const IMAGE_DYNAMIC_FORMATS: [&str; 17] = [
    "avif", "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi",
    "tga", "tif", "tiff", "webp",
];

// Formats that can hold a label image (16-bit rasters or u32 numpy arrays)
pub const LABEL_FORMATS: [&str; 4] = ["tif", "tiff", "png", "npy"];

// All currently supported point prompt formats
pub const SUPPORTED_POINT_FORMATS: [&str; 4] = ["csv", "tsv", "txt", "json"];

// Table columns holding the row (y) coordinate of a point prompt
pub const POINT_ROW_KEYS: [&str; 3] = ["y", "row", "axis-0"];

// Table columns holding the column (x) coordinate of a point prompt
pub const POINT_COL_KEYS: [&str; 4] = ["x", "col", "column", "axis-1"];

// Table column holding the positive (1) or negative (0) prompt label
pub const POINT_LABEL_KEY: &str = "label";

// The valid json keys indicating point prompt values
pub const POINT_JSON_VALID_KEYS: [&str; 4] = ["points", "prompts", "coordinates", "yx"];

// Default tile and halo shapes (height, width) for tiled embeddings
pub const DEFAULT_TILE_SHAPE: (u32, u32) = (384, 384);
pub const DEFAULT_HALO: (u32, u32) = (64, 64);

// Default opacity of labels drawn over an image
pub const OVERLAY_ALPHA: f32 = 0.5;
