//! Access to RGB888 image buffers.
//!
//! Image buffers are plain byte slices: three bytes (red, green, blue) per
//! pixel, row-major, `COLS` pixels per row. The refresh loop only ever reads
//! them through a [`PixelSource`]; producers can draw into one with
//! [`RgbCanvas`].

use core::convert::Infallible;

use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Point, Size};

use crate::compute_image_len;
use crate::Color;

/// Read the pixel at (`x`, `y`) from an RGB888 buffer `cols` pixels wide.
///
/// # Panics
/// Panics if the pixel lies outside `buffer`.
#[inline]
#[must_use]
pub fn read_rgb(buffer: &[u8], cols: usize, x: usize, y: usize) -> Color {
    let offset = (x + y * cols) * 3;
    let p = &buffer[offset..offset + 3];
    Color::new(p[0], p[1], p[2])
}

/// Something the bitplane encoder can sample pixels from.
pub trait PixelSource {
    /// Color of the pixel at (`x`, `y`).
    fn pixel(&self, x: usize, y: usize) -> Color;

    /// Colors of the two pixels driven together by one scan word, at
    /// (`x`, `top`) and (`x`, `bottom`).
    fn pixel_pair(&self, x: usize, top: usize, bottom: usize) -> (Color, Color) {
        (self.pixel(x, top), self.pixel(x, bottom))
    }

    /// Called once before each render pass.
    fn begin_pass(&self) {}
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn pixel(&self, x: usize, y: usize) -> Color {
        (**self).pixel(x, y)
    }

    fn pixel_pair(&self, x: usize, top: usize, bottom: usize) -> (Color, Color) {
        (**self).pixel_pair(x, top, bottom)
    }

    fn begin_pass(&self) {
        (**self).begin_pass();
    }
}

/// A read-only RGB888 image that is exactly `COLS` pixels wide.
#[derive(Clone, Copy, Debug)]
pub struct RgbImage<'a, const COLS: usize> {
    data: &'a [u8],
}

impl<'a, const COLS: usize> RgbImage<'a, COLS> {
    /// Wrap `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The wrapped bytes.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }
}

impl<const COLS: usize> PixelSource for RgbImage<'_, COLS> {
    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Color {
        read_rgb(self.data, COLS, x, y)
    }
}

/// An `embedded-graphics` canvas over a caller-owned RGB888 buffer.
///
/// Producers draw a frame here and then install the buffer with
/// [`crate::handoff::FrameHandoff::install`].
///
/// # Example
/// ```rust
/// use embedded_graphics::pixelcolor::RgbColor;
/// use embedded_graphics::prelude::*;
/// use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
/// use hub75_bitplane::pixel::RgbCanvas;
/// use hub75_bitplane::{compute_image_len, Color};
///
/// const COLS: usize = 64;
/// const ROWS: usize = 32;
///
/// let mut image = [0u8; compute_image_len(COLS, ROWS)];
/// let mut canvas = RgbCanvas::<COLS, ROWS>::new(&mut image);
/// Rectangle::new(Point::new(0, 0), Size::new(4, 4))
///     .into_styled(PrimitiveStyle::with_fill(Color::RED))
///     .draw(&mut canvas)
///     .unwrap();
/// assert_eq!(&image[..3], &[255, 0, 0]);
/// ```
#[derive(Debug)]
pub struct RgbCanvas<'a, const COLS: usize, const ROWS: usize> {
    data: &'a mut [u8],
}

impl<'a, const COLS: usize, const ROWS: usize> RgbCanvas<'a, COLS, ROWS> {
    /// Wrap `data` as a `COLS` × `ROWS` canvas.
    ///
    /// # Panics
    /// Panics if `data` is shorter than `COLS * ROWS * 3` bytes.
    pub fn new(data: &'a mut [u8]) -> Self {
        assert!(
            data.len() >= compute_image_len(COLS, ROWS),
            "image buffer too small for the canvas"
        );
        Self { data }
    }

    /// Set a pixel, ignoring points outside the canvas.
    pub fn set_pixel(&mut self, p: Point, color: Color) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        self.set_pixel_internal(p.x as usize, p.y as usize, color);
    }

    fn set_pixel_internal(&mut self, x: usize, y: usize, color: Color) {
        if x >= COLS || y >= ROWS {
            return;
        }
        let offset = (x + y * COLS) * 3;
        self.data[offset] = color.r();
        self.data[offset + 1] = color.g();
        self.data[offset + 2] = color.b();
    }

    /// Read back a pixel.
    ///
    /// # Panics
    /// Panics if the pixel lies outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        read_rgb(self.data, COLS, x, y)
    }

    /// Give the buffer back, e.g. to install it.
    #[must_use]
    pub fn into_inner(self) -> &'a mut [u8] {
        self.data
    }
}

impl<const COLS: usize, const ROWS: usize> OriginDimensions for RgbCanvas<'_, COLS, ROWS> {
    fn size(&self) -> Size {
        Size::new(COLS as u32, ROWS as u32)
    }
}

impl<const COLS: usize, const ROWS: usize> DrawTarget for RgbCanvas<'_, COLS, ROWS> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for pixel in pixels {
            self.set_pixel(pixel.0, pixel.1);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for p in self.data[..compute_image_len(COLS, ROWS)].chunks_exact_mut(3) {
            p[0] = color.r();
            p[1] = color.g();
            p[2] = color.b();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;

    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    const COLS: usize = 8;
    const ROWS: usize = 4;

    #[test]
    fn test_read_rgb_offsets() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS)];
        // pixel (3, 2)
        let offset = (3 + 2 * COLS) * 3;
        data[offset] = 0x12;
        data[offset + 1] = 0x34;
        data[offset + 2] = 0x56;

        assert_eq!(read_rgb(&data, COLS, 3, 2), Color::new(0x12, 0x34, 0x56));
        assert_eq!(read_rgb(&data, COLS, 2, 3), Color::BLACK);
        assert_eq!(read_rgb(&data, COLS, 0, 0), Color::BLACK);
    }

    #[test]
    #[should_panic]
    fn test_read_rgb_out_of_bounds_panics() {
        let data = vec![0u8; compute_image_len(COLS, ROWS)];
        let _ = read_rgb(&data, COLS, 0, ROWS);
    }

    #[test]
    fn test_rgb_image_source() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS)];
        data[(1 + COLS) * 3 + 1] = 0xff;
        let image = RgbImage::<COLS>::new(&data);

        assert_eq!(image.pixel(1, 1), Color::GREEN);
        assert_eq!(
            image.pixel_pair(1, 1, 3),
            (Color::GREEN, Color::BLACK)
        );
        assert_eq!((&image).pixel(1, 1), Color::GREEN);
    }

    #[test]
    fn test_canvas_set_pixel() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS)];
        let mut canvas = RgbCanvas::<COLS, ROWS>::new(&mut data);

        canvas.set_pixel(Point::new(7, 3), Color::new(1, 2, 3));
        canvas.set_pixel(Point::new(-1, 0), Color::WHITE);
        canvas.set_pixel(Point::new(8, 0), Color::WHITE);
        canvas.set_pixel(Point::new(0, 4), Color::WHITE);
        assert_eq!(canvas.pixel(7, 3), Color::new(1, 2, 3));

        let data = canvas.into_inner();
        let lit = data.iter().filter(|b| **b != 0).count();
        assert_eq!(lit, 3);
        assert_eq!(&data[data.len() - 3..], &[1, 2, 3]);
    }

    #[test]
    fn test_canvas_draw_rectangle() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS)];
        let mut canvas = RgbCanvas::<COLS, ROWS>::new(&mut data);

        Rectangle::new(Point::new(2, 1), Size::new(3, 2))
            .into_styled(PrimitiveStyle::with_fill(Color::BLUE))
            .draw(&mut canvas)
            .unwrap();

        for y in 0..ROWS {
            for x in 0..COLS {
                let inside = (2..5).contains(&x) && (1..3).contains(&y);
                let expected = if inside { Color::BLUE } else { Color::BLACK };
                assert_eq!(canvas.pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_canvas_clear_and_size() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS)];
        let mut canvas = RgbCanvas::<COLS, ROWS>::new(&mut data);
        assert_eq!(canvas.size(), Size::new(COLS as u32, ROWS as u32));

        canvas.clear(Color::YELLOW).unwrap();
        assert!(data.chunks_exact(3).all(|p| p == [255, 255, 0]));
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn test_canvas_too_small_panics() {
        let mut data = vec![0u8; compute_image_len(COLS, ROWS) - 1];
        let _ = RgbCanvas::<COLS, ROWS>::new(&mut data);
    }
}
