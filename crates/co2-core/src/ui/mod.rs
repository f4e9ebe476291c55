//! Display rendering for the monitor screen
//!
//! Rendering is split into pure layout/formatting code (readout strings and
//! graph scaling) and a thin [`Canvas`] abstraction that receives the draw
//! calls. [`GraphicsCanvas`] maps those calls onto any embedded-graphics
//! `DrawTarget<Color = BinaryColor>`.

mod canvas;
pub mod graph;
pub mod layout;
pub mod readout;
mod screen;

pub use canvas::{Canvas, Font, GraphicsCanvas};
pub use graph::GraphScale;
pub use screen::{MonitorView, draw_screen};
