// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Device, IndexOp, Result, Tensor};
use candle_transformers::models::segment_anything::sam::IMAGE_SIZE;

use sorrel_core::cv::transform::resize_longest_side;
use sorrel_core::im::SorrelImage;

/// Convert a SorrelImage to a (3, h, w) u8 tensor with its longest side at 1024
///
/// Any 1-channel image is repeated three times, images that aren't 1 or 3
/// channels are averaged across channels and 16-bit or float images are
/// min-max rescaled to 8 bits. Returns the tensor with its (height, width).
pub fn preprocess_sam(image: &SorrelImage, device: &Device) -> Result<(Tensor, (usize, usize))> {
    let (height, width) = resize_longest_side(image.height(), image.width(), IMAGE_SIZE as u32);

    let rgb = image
        .resize_rgb8(width, height)
        .map_err(candle_core::Error::wrap)?;

    let (h, w) = (height as usize, width as usize);
    let tensor = Tensor::from_vec(rgb.into_raw(), (h, w, 3), device)?.permute((2, 0, 1))?;

    Ok((tensor, (h, w)))
}

/// Keep the mask channel with the highest predicted IoU
///
/// # Arguments
///
/// * `low_res` - Mask logits of shape (1, k, 256, 256)
/// * `iou` - Predicted IoU scores of shape (1, k)
pub fn select_best_mask(low_res: &Tensor, iou: &Tensor) -> Result<Tensor> {
    let (_, k) = iou.dims2()?;
    if low_res.dim(1)? != k {
        return Err(candle_core::Error::Msg(format!(
            "[sorrel::preprocess] Expected {} mask channels but found {}.",
            k,
            low_res.dim(1)?
        )));
    }

    let best = iou
        .flatten_all()?
        .to_dtype(candle_core::DType::F32)?
        .argmax(0)?
        .to_scalar::<u32>()? as usize;

    low_res.i((.., best..best + 1))?.contiguous()
}

/// Convert low resolution mask logits to a binary mask at the original resolution
///
/// # Arguments
///
/// * `low_res` - Mask logits of shape (1, 1, 256, 256)
/// * `resized` - (height, width) of the image given to the encoder
/// * `original` - (height, width) of the image before resizing
pub fn postprocess_mask(
    low_res: &Tensor,
    resized: (usize, usize),
    original: (usize, usize),
) -> Result<Vec<u8>> {
    let (rh, rw) = resized;
    let (h, w) = original;

    let mask = low_res
        .upsample_nearest2d(IMAGE_SIZE, IMAGE_SIZE)?
        .i((.., .., ..rh, ..rw))?
        .contiguous()?
        .upsample_nearest2d(h, w)?;

    mask.ge(0f32)?.flatten_all()?.to_vec1::<u8>()
}

#[cfg(test)]
mod test {
    use super::*;

    use sorrel_core::im::SorrelBuffer;

    #[test]
    fn test_preprocess_sam_1channel() {
        let buffer: Vec<u8> = (0..200).map(|p| p as u8).collect();
        let image = SorrelImage::U8(SorrelBuffer::new(20, 10, 1, buffer).unwrap());
        let (tensor, resized) = preprocess_sam(&image, &Device::Cpu).unwrap();

        assert_eq!(resized, (512, 1024));
        assert_eq!(tensor.dims(), &[3, 512, 1024]);
    }

    #[test]
    fn test_preprocess_sam_nchannel() {
        let buffer: Vec<u16> = (0..(30 * 40 * 5)).map(|p| p as u16).collect();
        let image = SorrelImage::U16(SorrelBuffer::new(30, 40, 5, buffer).unwrap());
        let (tensor, resized) = preprocess_sam(&image, &Device::Cpu).unwrap();

        assert_eq!(resized, (1024, 768));
        assert_eq!(tensor.dims(), &[3, 1024, 768]);
    }

    #[test]
    fn test_select_best_mask() {
        let mut logits = vec![0f32; 3 * 4 * 4];
        for (channel, chunk) in logits.chunks_mut(16).enumerate() {
            chunk.fill(channel as f32);
        }

        let low_res = Tensor::from_vec(logits, (1, 3, 4, 4), &Device::Cpu).unwrap();
        let iou = Tensor::from_vec(vec![0.2f32, 0.9, 0.5], (1, 3), &Device::Cpu).unwrap();

        let best = select_best_mask(&low_res, &iou).unwrap();

        assert_eq!(best.dims(), &[1, 1, 4, 4]);
        assert_eq!(best.flatten_all().unwrap().to_vec1::<f32>().unwrap(), vec![1f32; 16]);
    }

    #[test]
    fn test_select_best_mask_channel_mismatch() {
        let low_res = Tensor::zeros((1, 1, 4, 4), candle_core::DType::F32, &Device::Cpu).unwrap();
        let iou = Tensor::zeros((1, 3), candle_core::DType::F32, &Device::Cpu).unwrap();

        assert!(select_best_mask(&low_res, &iou).is_err());
    }

    #[test]
    fn test_postprocess_mask() {
        // Positive logits on the top-left quarter of the 1024 x 1024 canvas
        let mut logits = vec![-1f32; 256 * 256];
        for y in 0..128 {
            for x in 0..128 {
                logits[y * 256 + x] = 1.0;
            }
        }

        let low_res = Tensor::from_vec(logits, (1, 1, 256, 256), &Device::Cpu).unwrap();
        let mask = postprocess_mask(&low_res, (512, 1024), (50, 100)).unwrap();

        assert_eq!(mask.len(), 50 * 100);
        for y in 0..50 {
            for x in 0..100 {
                assert_eq!(mask[y * 100 + x], (x < 50) as u8);
            }
        }
    }
}
