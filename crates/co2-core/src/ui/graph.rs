//! CO2 history graph
//!
//! Maps the history ring buffer onto the plot area. Scaling is integer-only:
//!
//! 1. take min/max over all stored samples,
//! 2. pad by [`GRAPH_RANGE_PADDING`] below (only when min is above the
//!    padding, so the floor never underflows) and above,
//! 3. widen to at least [`GRAPH_MIN_RANGE`] by raising max, never lowering
//!    min.
//!
//! Samples are plotted oldest on the left, newest on the right, joined by
//! straight line segments.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::history::History;

use super::canvas::{Canvas, Font};
use super::layout::{
    COLLECTING_POSITION, COLLECTING_TEXT, GRAPH_MIN_RANGE, GRAPH_RANGE_PADDING, MAX_LABEL_POSITION,
    MIN_LABEL_POSITION, graph_frame, plot_area,
};
use super::readout::format_axis_label;

/// Vertical scale chosen for a set of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphScale {
    min: u32,
    max: u32,
}

impl GraphScale {
    /// Compute the scale for `samples`, or `None` when there are none.
    pub fn from_samples<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = u16>,
    {
        let (min, max) = samples.into_iter().fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((value.min(min), value.max(max))),
        })?;

        let mut min = u32::from(min);
        let mut max = u32::from(max);

        if min > GRAPH_RANGE_PADDING {
            min -= GRAPH_RANGE_PADDING;
        }
        max += GRAPH_RANGE_PADDING;

        if max - min < GRAPH_MIN_RANGE {
            max = min + GRAPH_MIN_RANGE;
        }

        Some(Self { min, max })
    }

    /// Value drawn at the bottom of the plot area
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Value drawn at the top of the plot area
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Value span of the plot area, never below [`GRAPH_MIN_RANGE`]
    pub fn range(&self) -> u32 {
        self.max - self.min
    }

    /// Screen position of sample `index` out of `count` inside `area`.
    ///
    /// `count` must be at least 2.
    pub fn point(&self, index: usize, count: usize, value: u16, area: Rectangle) -> Point {
        let width = area.size.width.saturating_sub(1) as usize;
        let height = area.size.height.saturating_sub(1);
        let top = area.top_left.y;
        let bottom = top + height as i32;

        let x = area.top_left.x + (index * width / count.saturating_sub(1).max(1)) as i32;

        let offset = u32::from(value).saturating_sub(self.min) * height / self.range();
        let y = (bottom - offset as i32).clamp(top, bottom);

        Point::new(x, y)
    }
}

/// Draw the graph frame and either the plot or the "collecting" placeholder.
pub fn draw_graph<C, const N: usize>(canvas: &mut C, history: &History<N>) -> Result<(), C::Error>
where
    C: Canvas,
{
    canvas.draw_frame(graph_frame())?;
    canvas.set_font(Font::Secondary);

    let count = history.len();
    let scale = match GraphScale::from_samples(history) {
        Some(scale) if count >= 2 => scale,
        _ => return canvas.draw_str(COLLECTING_POSITION, COLLECTING_TEXT),
    };

    canvas.draw_str(MAX_LABEL_POSITION, &format_axis_label(scale.max()))?;
    canvas.draw_str(MIN_LABEL_POSITION, &format_axis_label(scale.min()))?;

    let area = plot_area();
    let mut previous: Option<Point> = None;
    for (index, value) in history.iter().enumerate() {
        let point = scale.point(index, count, value, area);
        if let Some(start) = previous {
            canvas.draw_line(start, point)?;
        }
        previous = Some(point);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::layout::{GRAPH_HEIGHT_PX, GRAPH_WIDTH_PX, GRAPH_X_PX, GRAPH_Y_PX};

    const BOTTOM: i32 = GRAPH_Y_PX + GRAPH_HEIGHT_PX as i32 - 1;
    const RIGHT: i32 = GRAPH_X_PX + GRAPH_WIDTH_PX as i32 - 1;

    #[test]
    fn test_flat_samples_force_minimum_range() {
        let scale = GraphScale::from_samples([800, 800, 800]).unwrap();
        assert_eq!(scale.range(), 100);
        assert_eq!(scale.min(), 750);
        assert_eq!(scale.max(), 850);

        let point = scale.point(1, 3, 800, plot_area());
        assert_eq!(point.y, BOTTOM - 50 * 39 / 100);
    }

    #[test]
    fn test_padding_applied_to_wide_range() {
        let scale = GraphScale::from_samples([400, 1200]).unwrap();
        assert_eq!(scale.min(), 350);
        assert_eq!(scale.max(), 1250);
        assert_eq!(scale.range(), 900);
    }

    #[test]
    fn test_low_minimum_is_not_padded() {
        // min ≤ 50 keeps its floor; the asymmetric padding is intentional.
        let scale = GraphScale::from_samples([30, 40]).unwrap();
        assert_eq!(scale.min(), 30);
        assert_eq!(scale.max(), 130);

        let scale = GraphScale::from_samples([50, 60]).unwrap();
        assert_eq!(scale.min(), 50);
        assert_eq!(scale.max(), 150);
    }

    #[test]
    fn test_max_value_does_not_overflow() {
        let scale = GraphScale::from_samples([u16::MAX]).unwrap();
        assert_eq!(scale.max(), u32::from(u16::MAX) + 50);
    }

    #[test]
    fn test_empty_samples_have_no_scale() {
        assert_eq!(GraphScale::from_samples([]), None);
    }

    #[test]
    fn test_points_span_plot_area() {
        let scale = GraphScale::from_samples([400, 600, 1000]).unwrap();
        let area = plot_area();

        let first = scale.point(0, 3, 400, area);
        let last = scale.point(2, 3, 1000, area);

        assert_eq!(first.x, GRAPH_X_PX);
        assert_eq!(last.x, RIGHT);
        // Padding keeps extremes off the border
        assert!(first.y < BOTTOM);
        assert!(last.y > GRAPH_Y_PX);
        assert!(last.y < first.y);
    }

    #[test]
    fn test_points_clamped_to_plot_area() {
        let scale = GraphScale::from_samples([800]).unwrap();
        let area = plot_area();

        assert_eq!(scale.point(0, 2, 5000, area).y, GRAPH_Y_PX);
        assert_eq!(scale.point(0, 2, 0, area).y, BOTTOM);
    }
}
