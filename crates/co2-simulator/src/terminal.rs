//! Terminal draw target
//!
//! Receives framebuffer flushes and prints the 128×64 screen with Unicode
//! half blocks, two pixel rows per text line.

use std::convert::Infallible;
use std::io::{self, Write};

use co2_core::ui::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Move the cursor home so each frame overwrites the previous one.
const CURSOR_HOME: &str = "\x1b[H";
const CLEAR_SCREEN: &str = "\x1b[2J";

pub struct TerminalDisplay {
    pixels: Vec<bool>,
    changed: bool,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            pixels: vec![false; WIDTH * HEIGHT],
            changed: true,
        }
    }

    fn pixel(&self, x: usize, y: usize) -> bool {
        y < HEIGHT && self.pixels[y * WIDTH + x]
    }

    /// Print the screen if anything was drawn since the last call.
    pub fn present(&mut self, first: bool) -> io::Result<()> {
        if !self.changed {
            return Ok(());
        }
        self.changed = false;

        let mut out = String::with_capacity((WIDTH * 3 + 4) * (HEIGHT / 2 + 2));
        if first {
            out.push_str(CLEAR_SCREEN);
        }
        out.push_str(CURSOR_HOME);

        out.push('┌');
        out.extend(std::iter::repeat_n('─', WIDTH));
        out.push_str("┐\n");
        for y in (0..HEIGHT).step_by(2) {
            out.push('│');
            for x in 0..WIDTH {
                out.push(match (self.pixel(x, y), self.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push_str("│\n");
        }
        out.push('└');
        out.extend(std::iter::repeat_n('─', WIDTH));
        out.push_str("┘\n");

        let mut stdout = io::stdout().lock();
        stdout.write_all(out.as_bytes())?;
        stdout.flush()
    }
}

impl OriginDimensions for TerminalDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for TerminalDisplay {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let Ok((x, y)) = <(u32, u32)>::try_from(coord)
                && (x as usize) < WIDTH
                && (y as usize) < HEIGHT
            {
                self.pixels[y as usize * WIDTH + x as usize] = color.is_on();
                self.changed = true;
            }
        }
        Ok(())
    }
}
