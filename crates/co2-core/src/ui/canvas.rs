//! Render surface abstraction
//!
//! The screen renderer only needs a handful of primitives: clear, font
//! selection, text, lines and rectangle frames. [`Canvas`] captures exactly
//! those so tests can record draw calls and hardware can use any
//! embedded-graphics display through [`GraphicsCanvas`].

use embedded_graphics::mono_font::{
    MonoFont, MonoTextStyle,
    ascii::{FONT_5X8, FONT_6X13_BOLD},
};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;

/// Stroke width for lines and frames in pixels
const STROKE_WIDTH_PX: u32 = 1;

/// Font selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    /// Bold font for the title
    Primary,
    /// Small font for readouts and labels
    #[default]
    Secondary,
}

impl Font {
    /// Mono font used to draw this selection
    pub const fn mono_font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Primary => &FONT_6X13_BOLD,
            Self::Secondary => &FONT_5X8,
        }
    }
}

/// Minimal 2D drawing surface.
///
/// Text positions are baseline positions.
pub trait Canvas {
    type Error;

    /// Erase the whole surface.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Select the font for subsequent text.
    fn set_font(&mut self, font: Font);

    fn draw_str(&mut self, position: Point, text: &str) -> Result<(), Self::Error>;

    fn draw_line(&mut self, start: Point, end: Point) -> Result<(), Self::Error>;

    /// Draw the one-pixel outline of `area`.
    fn draw_frame(&mut self, area: Rectangle) -> Result<(), Self::Error>;
}

/// [`Canvas`] over an embedded-graphics monochrome draw target.
///
/// The target is bound at construction and borrowed for the canvas lifetime.
pub struct GraphicsCanvas<'a, T> {
    target: &'a mut T,
    font: Font,
}

impl<'a, T> GraphicsCanvas<'a, T>
where
    T: DrawTarget<Color = BinaryColor>,
{
    pub fn new(target: &'a mut T) -> Self {
        Self {
            target,
            font: Font::default(),
        }
    }

    /// Currently selected font
    pub fn font(&self) -> Font {
        self.font
    }

    fn stroke() -> PrimitiveStyle<BinaryColor> {
        PrimitiveStyle::with_stroke(BinaryColor::On, STROKE_WIDTH_PX)
    }
}

impl<T> Canvas for GraphicsCanvas<'_, T>
where
    T: DrawTarget<Color = BinaryColor>,
{
    type Error = T::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.target.clear(BinaryColor::Off)
    }

    fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    fn draw_str(&mut self, position: Point, text: &str) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(self.font.mono_font(), BinaryColor::On);
        Text::new(text, position, style).draw(&mut *self.target)?;
        Ok(())
    }

    fn draw_line(&mut self, start: Point, end: Point) -> Result<(), Self::Error> {
        Line::new(start, end)
            .into_styled(Self::stroke())
            .draw(&mut *self.target)
    }

    fn draw_frame(&mut self, area: Rectangle) -> Result<(), Self::Error> {
        area.into_styled(Self::stroke()).draw(&mut *self.target)
    }
}
