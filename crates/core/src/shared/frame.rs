use ndarray::ArrayView3;

use super::bounding_box::BoundingBox;

/// Bytes per pixel of the packed RGB24 layout used end to end: the reader
/// converts into it and the encoder sink is told to expect it.
pub const CHANNELS: usize = 3;

/// One decoded video frame: packed RGB24 bytes in row-major order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position in decode order, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channel)` view for tensor preprocessing.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox` (clamped to the frame) into a packed
    /// buffer. Returns `None` when nothing of the box is visible.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<(Vec<u8>, u32, u32)> {
        let clamped = bbox.clamp_to(self.width, self.height)?;
        let w = clamped.width() as usize;
        let h = clamped.height() as usize;
        let stride = self.width as usize * CHANNELS;

        let mut pixels = Vec::with_capacity(w * h * CHANNELS);
        for row in clamped.y1 as usize..clamped.y2 as usize {
            let start = row * stride + clamped.x1 as usize * CHANNELS;
            pixels.extend_from_slice(&self.data[start..start + w * CHANNELS]);
        }
        Some((pixels, w as u32, h as u32))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_data_mut_allows_modification() {
        let mut frame = Frame::new(vec![0u8; 6], 2, 1, 0);
        frame.data_mut()[0] = 255;
        assert_eq!(frame.data()[0], 255);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2: pixel (row=1, col=0) red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_crop_copies_region() {
        // 4x2 frame where each pixel's R channel holds its column index.
        let mut data = vec![0u8; 4 * 2 * 3];
        for row in 0..2 {
            for col in 0..4 {
                data[(row * 4 + col) * 3] = col as u8;
            }
        }
        let frame = Frame::new(data, 4, 2, 0);

        let (pixels, w, h) = frame.crop(&BoundingBox::new(1, 0, 3, 2)).unwrap();

        assert_eq!((w, h), (2, 2));
        assert_eq!(pixels.len(), 2 * 2 * 3);
        assert_eq!(pixels[0], 1);
        assert_eq!(pixels[3], 2);
        assert_eq!(pixels[6], 1);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = Frame::new(vec![7u8; 10 * 10 * 3], 10, 10, 0);
        let (_, w, h) = frame.crop(&BoundingBox::new(-5, -5, 4, 3)).unwrap();
        assert_eq!((w, h), (4, 3));
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 0);
        assert!(frame.crop(&BoundingBox::new(20, 20, 30, 30)).is_none());
    }
}
