//! Screen geometry for the 128×64 monochrome display
//!
//! Text positions are baseline positions, matching how the fonts are drawn.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Display width in pixels
pub const DISPLAY_WIDTH_PX: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT_PX: u32 = 64;

// ============================================================================
// Header
// ============================================================================

/// Screen title
pub const TITLE: &str = "SCD41";

pub const TITLE_POSITION: Point = Point::new(2, 10);

/// Status overlay next to the title
pub const STATUS_OVERLAY_POSITION: Point = Point::new(40, 10);

// ============================================================================
// Sensor fault screen
// ============================================================================

pub const FAULT_STATUS_POSITION: Point = Point::new(2, 24);

pub const WIRING_HINT: &str = "Check wiring / I2C";

pub const WIRING_HINT_POSITION: Point = Point::new(2, 36);

// ============================================================================
// Readout column
// ============================================================================

/// Left edge of the readout column in pixels
pub const READOUT_X_PX: i32 = 2;

pub const CO2_LABEL: &str = "CO2:";

pub const CO2_LABEL_POSITION: Point = Point::new(READOUT_X_PX, 24);

pub const CO2_VALUE_POSITION: Point = Point::new(READOUT_X_PX, 34);

pub const TEMPERATURE_POSITION: Point = Point::new(READOUT_X_PX, 48);

pub const HUMIDITY_POSITION: Point = Point::new(READOUT_X_PX, 58);

// ============================================================================
// Graph
// ============================================================================

/// Left edge of the plot area in pixels
pub const GRAPH_X_PX: i32 = 36;

/// Top edge of the plot area in pixels
pub const GRAPH_Y_PX: i32 = 22;

/// Plot area width in pixels (one column per history sample)
pub const GRAPH_WIDTH_PX: u32 = 90;

/// Plot area height in pixels
pub const GRAPH_HEIGHT_PX: u32 = 40;

/// Border drawn around the plot area
pub const GRAPH_BORDER_PX: u32 = 1;

/// Padding added above the maximum and below the minimum sample
pub const GRAPH_RANGE_PADDING: u32 = 50;

/// Smallest value range the graph is scaled to
pub const GRAPH_MIN_RANGE: u32 = 100;

/// Placeholder shown until two samples are available
pub const COLLECTING_TEXT: &str = "Collecting...";

pub const COLLECTING_POSITION: Point = Point::new(GRAPH_X_PX + 15, GRAPH_Y_PX + 22);

/// Max label, inside the top-left of the plot area
pub const MAX_LABEL_POSITION: Point = Point::new(GRAPH_X_PX + 2, GRAPH_Y_PX + 6);

/// Min label, inside the bottom-left of the plot area
pub const MIN_LABEL_POSITION: Point =
    Point::new(GRAPH_X_PX + 2, GRAPH_Y_PX + GRAPH_HEIGHT_PX as i32 - 2);

/// Area samples are plotted into
pub const fn plot_area() -> Rectangle {
    Rectangle::new(
        Point::new(GRAPH_X_PX, GRAPH_Y_PX),
        Size::new(GRAPH_WIDTH_PX, GRAPH_HEIGHT_PX),
    )
}

/// Frame around the plot area, border included
pub const fn graph_frame() -> Rectangle {
    Rectangle::new(
        Point::new(
            GRAPH_X_PX - GRAPH_BORDER_PX as i32,
            GRAPH_Y_PX - GRAPH_BORDER_PX as i32,
        ),
        Size::new(
            GRAPH_WIDTH_PX + 2 * GRAPH_BORDER_PX,
            GRAPH_HEIGHT_PX + 2 * GRAPH_BORDER_PX,
        ),
    )
}
