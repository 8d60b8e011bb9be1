// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use image::{Rgb, RgbImage};

use crate::error::SorrelError;
use crate::im::{LabelImage, PointPrompt, SorrelImage};

const POINT_RADIUS: i64 = 3;
const POSITIVE_COLOR: [u8; 3] = [255, 255, 255];
const NEGATIVE_COLOR: [u8; 3] = [230, 25, 25];

/// A deterministic color for a label, spreading hues by the golden ratio
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::label_color;
///
/// assert_eq!(label_color(0), [0, 0, 0]);
/// assert_eq!(label_color(7), label_color(7));
/// assert_ne!(label_color(1), label_color(2));
/// ```
pub fn label_color(label: u32) -> [u8; 3] {
    if label == 0 {
        return [0, 0, 0];
    }

    let hue = (label as f32 * 0.618_034).fract() * 6.0;
    let (s, v) = (0.75f32, 0.95f32);

    let c = v * s;
    let x = c * (1.0 - (hue % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match hue as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Draw labeled objects and point prompts on top of an image
///
/// Labeled pixels are blended with their label color, object boundaries are
/// drawn with the full label color, and each prompt is drawn as a small cross
/// (white for positive, red for negative prompts).
///
/// # Arguments
///
/// * `image` - Source image with any number of channels
/// * `labels` - Label image with the same height and width as `image`
/// * `points` - Point prompts in pixel coordinates
/// * `alpha` - Opacity of label colors in [0, 1]
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::render_overlay;
/// use sorrel_core::im::{LabelImage, SorrelBuffer, SorrelImage};
///
/// let image = SorrelImage::U8(SorrelBuffer::new(2, 1, 1, vec![10u8, 20]).unwrap());
/// let labels = LabelImage::new(2, 1, 1, vec![0, 0]).unwrap();
///
/// let overlay = render_overlay(&image, &labels, &[], 0.5).unwrap();
/// assert_eq!(overlay.get_pixel(1, 0).0, [20, 20, 20]);
/// ```
pub fn render_overlay(
    image: &SorrelImage,
    labels: &LabelImage,
    points: &[PointPrompt],
    alpha: f32,
) -> Result<RgbImage, SorrelError> {
    if (image.height(), image.width()) != (labels.height(), labels.width()) {
        return Err(SorrelError::ImageError(
            "Label image shape does not match the image shape.",
        ));
    }

    if !(0.0..=1.0).contains(&alpha) {
        return Err(SorrelError::ImageError("Overlay alpha must lie in [0, 1]."));
    }

    let mut canvas = image.to_rgb8()?;
    let (width, height) = canvas.dimensions();

    for y in 0..height {
        for x in 0..width {
            let label = labels.as_raw()[(y * width + x) as usize];
            if label == 0 {
                continue;
            }

            let color = label_color(label);
            let pixel = canvas.get_pixel_mut(x, y);

            if labels.is_boundary(x, y) {
                *pixel = Rgb(color);
                continue;
            }

            for (channel, &c) in pixel.0.iter_mut().zip(color.iter()) {
                *channel = ((1.0 - alpha) * *channel as f32 + alpha * c as f32).round() as u8;
            }
        }
    }

    for point in points {
        let color = if point.positive {
            POSITIVE_COLOR
        } else {
            NEGATIVE_COLOR
        };

        draw_cross_mut(&mut canvas, point.row, point.col, color);
    }

    Ok(canvas)
}

/// Draw a cross centered on (row, col), clipped to the canvas
fn draw_cross_mut(canvas: &mut RgbImage, row: f32, col: f32, color: [u8; 3]) {
    let (width, height) = canvas.dimensions();
    let (r, c) = (row.floor() as i64, col.floor() as i64);

    for offset in -POINT_RADIUS..=POINT_RADIUS {
        for (y, x) in [(r + offset, c), (r, c + offset)] {
            if y >= 0 && x >= 0 && y < height as i64 && x < width as i64 {
                canvas.put_pixel(x as u32, y as u32, Rgb(color));
            }
        }
    }
}
