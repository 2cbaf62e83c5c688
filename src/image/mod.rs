//! Minimal image-buffer abstraction used by the detection core.
//!
//! The engine never depends on a specific vision library: it consumes a
//! borrowed single-channel [`ImageU8`] view where any non-zero pixel is
//! foreground (the binarizer emits 255). [`GrayBuffer`] is the owned
//! counterpart used by I/O and preprocessing.

pub mod binarize;
pub mod io;

use crate::geometry::Point;

/// Borrowed 8-bit single-channel image view.
#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    /// Bytes between rows.
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Foreground test with bounds clamping: out-of-image pixels read as
    /// background.
    #[inline]
    pub fn fg(&self, p: Point) -> bool {
        p.in_bounds(self.w, self.h) && self.get(p.x as usize, p.y as usize) != 0
    }
}

/// Owned 8-bit single-channel buffer with a borrowed view conversion.
#[derive(Clone, Debug)]
pub struct GrayBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayBuffer {
    /// Construct from raw bytes; `data.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height, "buffer size mismatch");
        Self {
            width,
            height,
            data,
        }
    }

    pub fn zeroed(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fg_is_bounds_safe() {
        let mut buf = GrayBuffer::zeroed(4, 4);
        buf.set(2, 1, 255);
        let view = buf.as_view();
        assert!(view.fg(Point::new(2, 1)));
        assert!(!view.fg(Point::new(0, 0)));
        assert!(!view.fg(Point::new(-1, 0)));
        assert!(!view.fg(Point::new(4, 2)));
    }
}
