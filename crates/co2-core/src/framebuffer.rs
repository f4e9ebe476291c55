//! Monochrome framebuffer with dirty-region tracking.
//!
//! The screen is drawn into this RAM buffer instead of the display. After
//! drawing completes, only the rectangular region containing changed pixels
//! is flushed to the real display.

use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::ui::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// One bit per pixel, row-major, least significant bit leftmost.
const BUFFER_LEN: usize = WIDTH * HEIGHT / 8;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Create a new dirty rect covering a single pixel.
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }
}

/// 128×64 1-bit framebuffer implementing `DrawTarget<Color = BinaryColor>`.
pub struct FrameBuffer {
    pixels: [u8; BUFFER_LEN],
    dirty: Option<DirtyRect>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A framebuffer with every pixel off.
    pub const fn new() -> Self {
        Self {
            pixels: [0; BUFFER_LEN],
            dirty: None,
        }
    }

    /// Whether the pixel at (`x`, `y`) is on. Out-of-range pixels are off.
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as usize, y as usize);
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let (byte, bit) = Self::locate(x, y);
        self.pixels[byte] & bit != 0
    }

    /// Whether anything changed since the last flush
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    #[inline]
    fn locate(x: usize, y: usize) -> (usize, u8) {
        let index = y * WIDTH + x;
        (index / 8, 1 << (index % 8))
    }

    /// Write a single pixel, expanding the dirty rect only if it changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, bit) = Self::locate(x, y);
        let was_on = self.pixels[byte] & bit != 0;
        if was_on == color.is_on() {
            return;
        }

        self.pixels[byte] ^= bit;
        match &mut self.dirty {
            Some(rect) => rect.expand(x, y),
            None => self.dirty = Some(DirtyRect::from_point(x, y)),
        }
    }

    /// Flush the dirty region to a display, then reset the dirty state.
    ///
    /// Only the bounding rectangle of changed pixels is sent, via
    /// `fill_contiguous`. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let width = rect.max_x - rect.min_x + 1;
        let height = rect.max_y - rect.min_y + 1;

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            width, height, rect.min_x, rect.min_y
        );

        let area = Rectangle::new(
            Point::new(rect.min_x as i32, rect.min_y as i32),
            Size::new(width as u32, height as u32),
        );

        let this = &*self;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            (rect.min_x..=rect.max_x)
                .map(move |x| BinaryColor::from(this.is_on(x as u32, y as u32)))
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        let (x_start, y_start) = (area.top_left.x as usize, area.top_left.y as usize);
        let (x_end, y_end) = (bottom_right.x as usize + 1, bottom_right.y as usize + 1);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
