// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::error::SorrelError;

/// An axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub row: u32,
    pub col: u32,
    pub height: u32,
    pub width: u32,
}

impl Rect {
    /// Whether the pixel coordinate (row, col) falls inside the rectangle
    pub fn contains(&self, row: f32, col: f32) -> bool {
        row >= self.row as f32
            && col >= self.col as f32
            && row < (self.row + self.height) as f32
            && col < (self.col + self.width) as f32
    }

    /// Whether another rectangle lies fully inside this one
    pub fn encloses(&self, other: &Rect) -> bool {
        other.row >= self.row
            && other.col >= self.col
            && other.row + other.height <= self.row + self.height
            && other.col + other.width <= self.col + self.width
    }
}

/// A tile of an image with its inner region and halo-extended outer region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub inner: Rect,
    pub outer: Rect,
}

/// A grid of tiles covering an image
///
/// Inner tiles partition the image. Outer tiles grow each inner tile by the
/// halo on every side, clipped to the image bounds.
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::Tiling;
///
/// let tiling = Tiling::new(1000, 700, (384, 384), (64, 64)).unwrap();
/// assert_eq!(tiling.grid(), (3, 2));
///
/// let tile = tiling.locate(500.0, 100.0).unwrap();
/// assert_eq!((tile.inner.row, tile.inner.col), (384, 0));
/// assert_eq!((tile.outer.row, tile.outer.height), (320, 512));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tiling {
    height: u32,
    width: u32,
    tile_shape: (u32, u32),
    n_rows: u32,
    n_cols: u32,
    tiles: Vec<Tile>,
}

impl Tiling {
    /// Tile an image of (height, width) with tile and halo shapes given as (height, width)
    pub fn new(
        height: u32,
        width: u32,
        tile_shape: (u32, u32),
        halo: (u32, u32),
    ) -> Result<Tiling, SorrelError> {
        if tile_shape.0 == 0 || tile_shape.1 == 0 {
            return Err(SorrelError::TilingError("Tile shape must be positive."));
        }

        if height == 0 || width == 0 {
            return Err(SorrelError::TilingError("Image shape must be positive."));
        }

        // Images no larger than a tile are handled whole
        let (tile_h, tile_w) = if height <= tile_shape.0 && width <= tile_shape.1 {
            (height, width)
        } else {
            tile_shape
        };

        let n_rows = height.div_ceil(tile_h);
        let n_cols = width.div_ceil(tile_w);

        let mut tiles = Vec::with_capacity((n_rows * n_cols) as usize);

        for i in 0..n_rows {
            for j in 0..n_cols {
                let row = i * tile_h;
                let col = j * tile_w;

                let inner = Rect {
                    row,
                    col,
                    height: tile_h.min(height - row),
                    width: tile_w.min(width - col),
                };

                let outer_row = row.saturating_sub(halo.0);
                let outer_col = col.saturating_sub(halo.1);
                let outer_bottom = (row + inner.height + halo.0).min(height);
                let outer_right = (col + inner.width + halo.1).min(width);

                let outer = Rect {
                    row: outer_row,
                    col: outer_col,
                    height: outer_bottom - outer_row,
                    width: outer_right - outer_col,
                };

                tiles.push(Tile { inner, outer });
            }
        }

        Ok(Tiling {
            height,
            width,
            tile_shape: (tile_h, tile_w),
            n_rows,
            n_cols,
            tiles,
        })
    }

    /// Image shape as (height, width)
    pub fn shape(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    /// Number of tile rows and columns
    pub fn grid(&self) -> (u32, u32) {
        (self.n_rows, self.n_cols)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether the whole image is covered by one tile
    pub fn is_single(&self) -> bool {
        self.tiles.len() == 1
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Index of the tile whose inner region contains the pixel (row, col)
    pub fn locate_index(&self, row: f32, col: f32) -> Option<usize> {
        if !row.is_finite() || !col.is_finite() {
            return None;
        }

        if row < 0.0 || col < 0.0 || row >= self.height as f32 || col >= self.width as f32 {
            return None;
        }

        let i = (row as u32 / self.tile_shape.0).min(self.n_rows - 1);
        let j = (col as u32 / self.tile_shape.1).min(self.n_cols - 1);

        Some((i * self.n_cols + j) as usize)
    }

    /// Tile whose inner region contains the pixel (row, col)
    pub fn locate(&self, row: f32, col: f32) -> Option<&Tile> {
        self.locate_index(row, col).map(|idx| &self.tiles[idx])
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_locate_non_finite() {
        let tiling = Tiling::new(100, 100, (40, 40), (8, 8)).unwrap();

        assert!(tiling.locate(f32::NAN, 10.0).is_none());
        assert!(tiling.locate(10.0, f32::NAN).is_none());
        assert!(tiling.locate(f32::INFINITY, 10.0).is_none());
        assert_eq!(tiling.locate_index(10.0, 10.0), Some(0));
    }

    #[test]
    fn test_zero_tile_shape() {
        assert!(Tiling::new(10, 10, (0, 4), (1, 1)).is_err());
        assert!(Tiling::new(0, 10, (4, 4), (1, 1)).is_err());
    }

    #[test]
    fn test_small_image_single_tile() {
        let tiling = Tiling::new(200, 300, (384, 384), (64, 64)).unwrap();

        assert!(tiling.is_single());

        let tile = tiling.tiles()[0];
        let full = Rect {
            row: 0,
            col: 0,
            height: 200,
            width: 300,
        };

        assert_eq!(tile.inner, full);
        assert_eq!(tile.outer, full);
    }

    #[test]
    fn test_inner_tiles_partition_image() {
        let (height, width) = (53, 37);
        let tiling = Tiling::new(height, width, (16, 10), (3, 2)).unwrap();

        let mut coverage = vec![0u32; (height * width) as usize];
        for tile in tiling.tiles() {
            for y in tile.inner.row..tile.inner.row + tile.inner.height {
                for x in tile.inner.col..tile.inner.col + tile.inner.width {
                    coverage[(y * width + x) as usize] += 1;
                }
            }
        }

        assert!(coverage.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_outer_tiles_enclose_inner() {
        let tiling = Tiling::new(100, 90, (32, 32), (8, 8)).unwrap();
        let bounds = Rect {
            row: 0,
            col: 0,
            height: 100,
            width: 90,
        };

        for tile in tiling.tiles() {
            assert!(tile.outer.encloses(&tile.inner));
            assert!(bounds.encloses(&tile.outer));
        }

        // An interior tile grows by the halo on every side
        let tile = tiling.locate(40.0, 40.0).unwrap();
        assert_eq!(
            tile.outer,
            Rect {
                row: 24,
                col: 24,
                height: 48,
                width: 48
            }
        );
    }

    #[test]
    fn test_locate() {
        let tiling = Tiling::new(50, 50, (20, 20), (5, 5)).unwrap();

        for (row, col) in [(0.0, 0.0), (19.9, 20.0), (49.5, 49.5), (25.0, 7.0)] {
            let tile = tiling.locate(row, col).unwrap();
            assert!(tile.inner.contains(row, col));
        }

        assert!(tiling.locate(50.0, 0.0).is_none());
        assert!(tiling.locate(-0.5, 0.0).is_none());
    }
}
