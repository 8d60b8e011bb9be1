// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use candle_core::Result;

use sorrel_core::constant::{DEFAULT_HALO, DEFAULT_TILE_SHAPE};
use sorrel_core::cv::Tiling;
use sorrel_core::error::SorrelError;
use sorrel_core::im::{BinaryMask, PointPrompt, Points, SorrelImage};

use crate::nn::PointSegmenter;

/// Embeddings of every tile of an image
pub struct TiledEmbeddings<E> {
    pub tiling: Tiling,
    pub embeddings: Vec<E>,
}

/// Predicts full-image masks for point prompts, embedding large images tile by tile
///
/// Each tile is embedded with its halo so objects crossing a tile edge are
/// seen whole. A point is segmented within the tile whose inner region holds
/// it and the tile mask is pasted back at the tile's position.
pub struct Predictor<M: PointSegmenter> {
    model: M,
    tile_shape: (u32, u32),
    halo: (u32, u32),
}

impl<M: PointSegmenter> Predictor<M> {
    /// Initialize a predictor with tile and halo shapes given as (height, width)
    pub fn new(model: M, tile_shape: (u32, u32), halo: (u32, u32)) -> Self {
        Predictor {
            model,
            tile_shape,
            halo,
        }
    }

    /// Initialize a predictor with the default 384 x 384 tiles and 64 pixel halo
    pub fn with_defaults(model: M) -> Self {
        Self::new(model, DEFAULT_TILE_SHAPE, DEFAULT_HALO)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Embed an image once so that many points can be segmented against it
    pub fn prepare(&self, image: &SorrelImage) -> Result<TiledEmbeddings<M::Embedding>> {
        let tiling = Tiling::new(image.height(), image.width(), self.tile_shape, self.halo)
            .map_err(candle_core::Error::wrap)?;

        let embeddings = if tiling.is_single() {
            vec![self.model.embed(image)?]
        } else {
            tiling
                .tiles()
                .iter()
                .map(|tile| {
                    let crop = image
                        .crop(
                            tile.outer.col,
                            tile.outer.row,
                            tile.outer.width,
                            tile.outer.height,
                        )
                        .map_err(candle_core::Error::wrap)?;

                    self.model.embed(&crop)
                })
                .collect::<Result<Vec<M::Embedding>>>()?
        };

        Ok(TiledEmbeddings { tiling, embeddings })
    }

    /// Predict a full-image binary mask for a single point prompt
    pub fn predict(
        &self,
        embeddings: &TiledEmbeddings<M::Embedding>,
        point: &PointPrompt,
    ) -> Result<BinaryMask> {
        let tiling = &embeddings.tiling;
        let (height, width) = tiling.shape();

        let idx = tiling.locate_index(point.row, point.col).ok_or_else(|| {
            candle_core::Error::wrap(SorrelError::PointBoundsError {
                row: point.row,
                col: point.col,
                height,
                width,
            })
        })?;

        let outer = tiling.tiles()[idx].outer;
        let local = point.shifted(outer.row, outer.col);

        let mask = self.model.segment(&embeddings.embeddings[idx], &local)?;

        if (mask.height(), mask.width()) != (outer.height, outer.width) {
            return Err(candle_core::Error::wrap(SorrelError::ShapeMismatchError {
                index: idx,
                expected: (outer.height, outer.width),
                found: (mask.height(), mask.width()),
            }));
        }

        if tiling.is_single() {
            return Ok(mask);
        }

        let mut full = BinaryMask::zeros(width, height, 1);
        full.paste(outer.col, outer.row, &mask)
            .map_err(candle_core::Error::wrap)?;

        Ok(full)
    }

    /// Embed an image and predict one mask per point, in point order
    pub fn predict_all(&self, image: &SorrelImage, points: &Points) -> Result<Vec<BinaryMask>> {
        points
            .validate(image.height(), image.width())
            .map_err(candle_core::Error::wrap)?;

        let embeddings = self.prepare(image)?;

        points
            .iter()
            .map(|point| self.predict(&embeddings, point))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Mutex;

    use crate::nn::Embedder;
    use sorrel_core::im::SorrelBuffer;

    /// Segments a 3 x 3 square centered on the point and records embedded shapes
    struct SquareSegmenter {
        embedded: Mutex<Vec<(u32, u32)>>,
    }

    impl SquareSegmenter {
        fn new() -> Self {
            SquareSegmenter {
                embedded: Mutex::new(Vec::new()),
            }
        }
    }

    impl Embedder for SquareSegmenter {
        type Embedding = (u32, u32);

        fn embed(&self, image: &SorrelImage) -> Result<(u32, u32)> {
            let shape = (image.height(), image.width());
            self.embedded.lock().unwrap().push(shape);
            Ok(shape)
        }
    }

    impl PointSegmenter for SquareSegmenter {
        fn segment(&self, embedding: &(u32, u32), point: &PointPrompt) -> Result<BinaryMask> {
            let (h, w) = *embedding;
            let (r, c) = (point.row as i64, point.col as i64);

            let mut mask = BinaryMask::zeros(w, h, 1);
            for y in (r - 1).max(0)..(r + 2).min(h as i64) {
                for x in (c - 1).max(0)..(c + 2).min(w as i64) {
                    mask.buffer[(y * w as i64 + x) as usize] = 1;
                }
            }

            Ok(mask)
        }
    }

    fn blank(width: u32, height: u32) -> SorrelImage {
        SorrelImage::U8(
            SorrelBuffer::new(width, height, 1, vec![0u8; (width * height) as usize]).unwrap(),
        )
    }

    fn foreground(mask: &BinaryMask) -> Vec<(u32, u32)> {
        let w = mask.width();
        mask.iter()
            .enumerate()
            .filter(|(_, p)| **p != 0)
            .map(|(i, _)| (i as u32 / w, i as u32 % w))
            .collect()
    }

    #[test]
    fn test_single_tile() {
        let predictor = Predictor::new(SquareSegmenter::new(), (32, 32), (4, 4));
        let image = blank(20, 10);

        let embeddings = predictor.prepare(&image).unwrap();
        assert_eq!(embeddings.embeddings.len(), 1);
        assert_eq!(*predictor.model().embedded.lock().unwrap(), vec![(10, 20)]);

        let mask = predictor
            .predict(&embeddings, &PointPrompt::positive(5.0, 5.0))
            .unwrap();

        assert_eq!(mask.shape(), (10, 20, 1));
        assert_eq!(mask.foreground_area(), 9);
    }

    #[test]
    fn test_tiled_mask_pasted_at_global_offset() {
        let predictor = Predictor::new(SquareSegmenter::new(), (8, 8), (2, 2));
        let image = blank(20, 20);

        let embeddings = predictor.prepare(&image).unwrap();
        assert_eq!(embeddings.embeddings.len(), 9);

        // The center tile is embedded with its halo on every side
        assert_eq!(embeddings.embeddings[4], (12, 12));

        let mask = predictor
            .predict(&embeddings, &PointPrompt::positive(10.0, 10.0))
            .unwrap();

        assert_eq!(mask.shape(), (20, 20, 1));

        let expected: Vec<(u32, u32)> = (9..12)
            .flat_map(|r| (9..12).map(move |c| (r, c)))
            .collect();
        assert_eq!(foreground(&mask), expected);
    }

    #[test]
    fn test_tiled_mask_near_image_edge() {
        let predictor = Predictor::new(SquareSegmenter::new(), (8, 8), (2, 2));
        let image = blank(20, 20);

        let masks = predictor
            .predict_all(
                &image,
                &Points::new(vec![
                    PointPrompt::positive(19.0, 0.0),
                    PointPrompt::negative(0.0, 17.5),
                ]),
            )
            .unwrap();

        assert_eq!(foreground(&masks[0]), vec![(18, 0), (18, 1), (19, 0), (19, 1)]);
        assert_eq!(
            foreground(&masks[1]),
            vec![(0, 16), (0, 17), (0, 18), (1, 16), (1, 17), (1, 18)]
        );
    }

    #[test]
    fn test_out_of_bounds_point() {
        let predictor = Predictor::new(SquareSegmenter::new(), (8, 8), (2, 2));
        let image = blank(20, 20);

        let result = predictor.predict_all(
            &image,
            &Points::new(vec![PointPrompt::positive(20.0, 0.0)]),
        );
        assert!(result.is_err());

        let embeddings = predictor.prepare(&image).unwrap();
        let result = predictor.predict(&embeddings, &PointPrompt::positive(-1.0, 3.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_point_rejected() {
        let predictor = Predictor::new(SquareSegmenter::new(), (8, 8), (2, 2));
        let embeddings = predictor.prepare(&blank(20, 20)).unwrap();

        let result = predictor.predict(&embeddings, &PointPrompt::positive(f32::NAN, 3.0));
        assert!(result.is_err());
    }
}
