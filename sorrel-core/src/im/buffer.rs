// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::iter::Iterator;
use std::marker::PhantomData;
use std::ops::Deref;

use num::{FromPrimitive, ToPrimitive, Zero};

use crate::error::SorrelError;

/// A row-major container storing an image buffer or grid of pixels.
///
/// The struct is generic over the data type `T` and over the container that
/// holds raw pixel/subpixel data as a slice (`[T]`) or vector (`Vec<T>`).
/// The container holding the pixel data must implement `Deref<Target = [T]>`
/// to allow for slice-like access to the data. The length of the container
/// must also be equal to the product of `w` * `h` * `c`.
///
/// # Examples
///
/// ```
/// use sorrel_core::im::SorrelBuffer;
///
/// let width = 10;
/// let height = 10;
/// let channels = 3; // RGB
/// let data = vec![0u8; (width * height * channels) as usize];
///
/// let buffer = SorrelBuffer::new(width, height, channels, data);
///
/// assert_eq!(buffer.unwrap().len(), (width * height * channels) as usize);
/// ```
///
/// ```
/// use sorrel_core::im::SorrelBuffer;
///
/// let data = vec![0u8; 7];
/// let buffer = SorrelBuffer::new(2, 2, 1, data);
///
/// assert!(buffer.is_err()); // Buffer size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SorrelBuffer<T, Container> {
    w: u32,                   // Width
    h: u32,                   // Height
    c: u32,                   // Channels
    pub buffer: Container,    // Slice
    _phantom: PhantomData<T>, // Pixel
}

impl<T, Container> SorrelBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Initializes a buffer from a generic data container
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `channels` - Number of image channels (e.g. 1 for grayscale)
    /// * `buffer` - A generic container (e.g. `Vec` or slice)
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        buffer: Container,
    ) -> Result<SorrelBuffer<T, Container>, SorrelError> {
        if width as usize * height as usize * channels as usize == buffer.len() {
            Ok(SorrelBuffer {
                w: width,
                h: height,
                c: channels,
                buffer,
                _phantom: PhantomData,
            })
        } else {
            Err(SorrelError::BufferSizeError)
        }
    }
}

impl<T> SorrelBuffer<T, Vec<T>>
where
    T: ToPrimitive + FromPrimitive + Zero + Clone,
{
    /// Initializes a zero-filled buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use sorrel_core::im::SorrelBuffer;
    ///
    /// let buffer = SorrelBuffer::<u32, Vec<u32>>::zeros(4, 3, 1);
    /// assert_eq!(buffer.shape(), (3, 4, 1));
    /// assert!(buffer.iter().all(|&p| p == 0));
    /// ```
    pub fn zeros(width: u32, height: u32, channels: u32) -> SorrelBuffer<T, Vec<T>> {
        SorrelBuffer {
            w: width,
            h: height,
            c: channels,
            buffer: vec![T::zero(); width as usize * height as usize * channels as usize],
            _phantom: PhantomData,
        }
    }
}

// >>> PROPERTY METHODS

impl<T, Container> SorrelBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Width of the image
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the image
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Number of channels in the image
    pub fn channels(&self) -> u32 {
        self.c
    }

    /// Shape/dimensions of the image
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.h, self.w, self.c)
    }

    /// Length of the raw image
    pub fn len(&self) -> usize {
        self.w as usize * self.h as usize * self.c as usize
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl<T, Container> SorrelBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Returns the raw image
    pub fn into_raw(self) -> Container {
        self.buffer
    }

    /// Returns a reference to the raw image
    pub fn as_raw(&self) -> &Container {
        &self.buffer
    }

    /// Cast subpixels to u8 and return the buffer
    pub fn to_u8(&self) -> Vec<u8> {
        self.buffer
            .iter()
            .map(|x| x.to_u8().unwrap_or(0u8))
            .collect()
    }

    /// Cast subpixels to u16 and return the buffer
    pub fn to_u16(&self) -> Vec<u16> {
        self.buffer
            .iter()
            .map(|x| x.to_u16().unwrap_or(0u16))
            .collect()
    }

    /// Cast subpixels to f32 and return the buffer
    pub fn to_f32(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .map(|x| x.to_f32().unwrap_or(0f32))
            .collect()
    }

    // An iterator over the raw buffer
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }
}

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl<T> SorrelBuffer<T, Vec<T>>
where
    T: Clone + ToPrimitive + FromPrimitive,
{
    /// Create a new buffer with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(
        &self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> Result<SorrelBuffer<T, Vec<T>>, SorrelError> {
        if x + w > self.w || y + h > self.h {
            return Err(SorrelError::ImageError("Cropping coordinates out of bounds"));
        }

        let c = self.c as usize;
        let orig_w = self.w as usize;

        let mut new_buffer = Vec::with_capacity(w as usize * h as usize * c);

        for row in y..y + h {
            let start = ((row as usize) * orig_w + (x as usize)) * c;
            let end = start + (w as usize) * c;
            new_buffer.extend_from_slice(&self.buffer[start..end]);
        }

        Ok(SorrelBuffer {
            w,
            h,
            c: self.c,
            buffer: new_buffer,
            _phantom: PhantomData,
        })
    }

    /// Copy a smaller buffer into this buffer with its top-left corner at (x, y)
    ///
    /// # Arguments
    ///
    /// * `x` - Column of the top-left corner of the pasted buffer
    /// * `y` - Row of the top-left corner of the pasted buffer
    /// * `source` - Buffer with the same number of channels
    ///
    /// # Examples
    ///
    /// ```
    /// use sorrel_core::im::SorrelBuffer;
    ///
    /// let mut canvas = SorrelBuffer::<u8, Vec<u8>>::zeros(3, 3, 1);
    /// let patch = SorrelBuffer::new(2, 1, 1, vec![7u8, 8]).unwrap();
    ///
    /// canvas.paste(1, 2, &patch).unwrap();
    /// assert_eq!(canvas.as_raw(), &[0, 0, 0, 0, 0, 0, 0, 7, 8]);
    /// ```
    pub fn paste(
        &mut self,
        x: u32,
        y: u32,
        source: &SorrelBuffer<T, Vec<T>>,
    ) -> Result<(), SorrelError> {
        if source.c != self.c {
            return Err(SorrelError::ChannelBoundsError);
        }

        if x + source.w > self.w || y + source.h > self.h {
            return Err(SorrelError::ImageError("Pasting coordinates out of bounds"));
        }

        let c = self.c as usize;
        let span = source.w as usize * c;

        for row in 0..source.h as usize {
            let src = row * span;
            let dst = ((y as usize + row) * self.w as usize + x as usize) * c;
            self.buffer[dst..dst + span].clone_from_slice(&source.buffer[src..src + span]);
        }

        Ok(())
    }
}

// <<< TRANSFORM METHODS

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_buffer_new_success() {
        let buffer = SorrelBuffer::new(1, 3, 2, [1, 2, 3, 4, 5, 6].as_slice());
        assert!(buffer.is_ok());
    }

    #[test]
    fn test_buffer_new_error() {
        let buffer = SorrelBuffer::new(2, 3, 2, [1, 2, 3, 4, 5, 6].as_slice());
        assert_eq!(buffer.unwrap_err(), SorrelError::BufferSizeError);
    }

    #[test]
    fn test_buffer_shape() {
        let buffer = SorrelBuffer::new(1, 3, 2, [1, 2, 3, 4, 5, 6].as_slice()).unwrap();
        assert_eq!(buffer.width(), 1);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.shape(), (3, 1, 2));
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_buffer_to_u8() {
        let buffer = SorrelBuffer::new(1, 2, 2, [2.5, 3.9, 4.8, 2.2].as_slice()).unwrap();
        assert_eq!(buffer.to_u8(), [2, 3, 4, 2]);
    }

    #[test]
    fn test_crop() {
        let buffer = SorrelBuffer::new(3, 3, 1, (0u8..9).collect::<Vec<u8>>()).unwrap();

        let crop = buffer.crop(1, 1, 2, 2).unwrap();
        assert_eq!(crop.as_raw(), &[4, 5, 7, 8]);

        assert!(buffer.crop(2, 2, 2, 2).is_err());
    }

    #[test]
    fn test_crop_then_paste() {
        let buffer = SorrelBuffer::new(4, 3, 2, (0u16..24).collect::<Vec<u16>>()).unwrap();
        let crop = buffer.crop(1, 1, 2, 2).unwrap();

        let mut canvas = SorrelBuffer::<u16, Vec<u16>>::zeros(4, 3, 2);
        canvas.paste(1, 1, &crop).unwrap();

        assert_eq!(canvas.crop(1, 1, 2, 2).unwrap(), crop);
        assert_eq!(canvas.as_raw()[..8], [0; 8]);
    }

    #[test]
    fn test_paste_out_of_bounds() {
        let mut canvas = SorrelBuffer::<u8, Vec<u8>>::zeros(2, 2, 1);
        let patch = SorrelBuffer::<u8, Vec<u8>>::zeros(2, 2, 1);

        assert!(canvas.paste(1, 0, &patch).is_err());
    }
}
