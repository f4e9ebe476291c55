//! Monitor screen renderer

use crate::history::History;
use crate::scd4x::Reading;

use super::canvas::{Canvas, Font};
use super::graph::draw_graph;
use super::layout::{
    CO2_LABEL, CO2_LABEL_POSITION, CO2_VALUE_POSITION, FAULT_STATUS_POSITION, HUMIDITY_POSITION,
    STATUS_OVERLAY_POSITION, TEMPERATURE_POSITION, TITLE, TITLE_POSITION, WIRING_HINT,
    WIRING_HINT_POSITION,
};
use super::readout::{format_co2, format_fahrenheit, format_humidity};

/// Everything the screen shows, passed explicitly to [`draw_screen`].
#[derive(Debug, Clone, Copy)]
pub struct MonitorView<'a, const N: usize> {
    /// Latest successful reading
    pub reading: Reading,
    /// Status message, empty when there is nothing to report
    pub status: &'a str,
    /// Whether the sensor is answering
    pub sensor_ok: bool,
    pub history: &'a History<N>,
}

/// Render the full monitor screen.
///
/// With a faulty sensor only the title, the status and a wiring hint are
/// shown. Otherwise the readout column, the CO2 graph and, when set, the
/// status overlay are drawn.
pub fn draw_screen<C, const N: usize>(
    canvas: &mut C,
    view: &MonitorView<'_, N>,
) -> Result<(), C::Error>
where
    C: Canvas,
{
    canvas.clear()?;
    canvas.set_font(Font::Primary);
    canvas.draw_str(TITLE_POSITION, TITLE)?;

    if !view.sensor_ok {
        canvas.set_font(Font::Secondary);
        canvas.draw_str(FAULT_STATUS_POSITION, view.status)?;
        canvas.draw_str(WIRING_HINT_POSITION, WIRING_HINT)?;
        // The status is already in the body; no title overlay on this screen.
        return Ok(());
    }

    draw_readout(canvas, &view.reading)?;
    draw_graph(canvas, view.history)?;

    if !view.status.is_empty() {
        canvas.set_font(Font::Secondary);
        canvas.draw_str(STATUS_OVERLAY_POSITION, view.status)?;
    }

    Ok(())
}

fn draw_readout<C: Canvas>(canvas: &mut C, reading: &Reading) -> Result<(), C::Error> {
    canvas.set_font(Font::Secondary);
    canvas.draw_str(CO2_LABEL_POSITION, CO2_LABEL)?;
    canvas.draw_str(CO2_VALUE_POSITION, &format_co2(reading.co2_ppm))?;
    canvas.draw_str(TEMPERATURE_POSITION, &format_fahrenheit(reading.temp_c_x100))?;
    canvas.draw_str(HUMIDITY_POSITION, &format_humidity(reading.rh_x100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::layout::{
        COLLECTING_POSITION, COLLECTING_TEXT, MAX_LABEL_POSITION, MIN_LABEL_POSITION, graph_frame,
    };
    use core::convert::Infallible;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Clear,
        Font(Font),
        Text(Point, String),
        Line(Point, Point),
        Frame(Rectangle),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        calls: Vec<Call>,
    }

    impl RecordingCanvas {
        fn texts(&self) -> Vec<(Point, &str)> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Text(p, s) => Some((*p, s.as_str())),
                    _ => None,
                })
                .collect()
        }

        fn lines(&self) -> Vec<(Point, Point)> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Line(a, b) => Some((*a, *b)),
                    _ => None,
                })
                .collect()
        }

        fn has_text(&self, position: Point, text: &str) -> bool {
            self.texts().contains(&(position, text))
        }
    }

    impl Canvas for RecordingCanvas {
        type Error = Infallible;

        fn clear(&mut self) -> Result<(), Infallible> {
            self.calls.push(Call::Clear);
            Ok(())
        }

        fn set_font(&mut self, font: Font) {
            self.calls.push(Call::Font(font));
        }

        fn draw_str(&mut self, position: Point, text: &str) -> Result<(), Infallible> {
            self.calls.push(Call::Text(position, text.to_string()));
            Ok(())
        }

        fn draw_line(&mut self, start: Point, end: Point) -> Result<(), Infallible> {
            self.calls.push(Call::Line(start, end));
            Ok(())
        }

        fn draw_frame(&mut self, area: Rectangle) -> Result<(), Infallible> {
            self.calls.push(Call::Frame(area));
            Ok(())
        }
    }

    fn reading() -> Reading {
        Reading {
            co2_ppm: 800,
            temp_c_x100: 1107,
            rh_x100: 4272,
        }
    }

    fn render<const N: usize>(view: &MonitorView<'_, N>) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::default();
        draw_screen(&mut canvas, view).unwrap();
        canvas
    }

    #[test]
    fn test_unhealthy_screen_skips_readout_and_graph() {
        let history = History::<90>::new();
        let canvas = render(&MonitorView {
            reading: reading(),
            status: "I2C error (no ACK?)",
            sensor_ok: false,
            history: &history,
        });

        assert_eq!(canvas.calls[0], Call::Clear);
        assert_eq!(
            canvas.texts(),
            vec![
                (TITLE_POSITION, TITLE),
                (FAULT_STATUS_POSITION, "I2C error (no ACK?)"),
                (WIRING_HINT_POSITION, WIRING_HINT),
            ]
        );
        assert!(!canvas.calls.iter().any(|c| matches!(c, Call::Frame(_))));
    }

    #[test]
    fn test_healthy_screen_shows_readout_and_placeholder() {
        let mut history = History::<90>::new();
        history.push(800);
        let canvas = render(&MonitorView {
            reading: reading(),
            status: "",
            sensor_ok: true,
            history: &history,
        });

        assert!(canvas.has_text(CO2_LABEL_POSITION, "CO2:"));
        assert!(canvas.has_text(CO2_VALUE_POSITION, "800"));
        assert!(canvas.has_text(TEMPERATURE_POSITION, "51.9F"));
        assert!(canvas.has_text(HUMIDITY_POSITION, "42%RH"));
        assert!(canvas.has_text(COLLECTING_POSITION, COLLECTING_TEXT));
        assert!(canvas.calls.contains(&Call::Frame(graph_frame())));
        assert!(canvas.lines().is_empty());
        // No overlay when the status is empty
        assert!(!canvas.texts().iter().any(|(p, _)| *p == STATUS_OVERLAY_POSITION));
    }

    #[test]
    fn test_graph_draws_polyline_and_labels() {
        let mut history = History::<90>::new();
        for value in [700, 800, 900, 800] {
            history.push(value);
        }
        let canvas = render(&MonitorView {
            reading: reading(),
            status: "Waiting...",
            sensor_ok: true,
            history: &history,
        });

        assert!(canvas.has_text(MAX_LABEL_POSITION, "950"));
        assert!(canvas.has_text(MIN_LABEL_POSITION, "650"));
        assert!(canvas.has_text(STATUS_OVERLAY_POSITION, "Waiting..."));
        assert!(!canvas.has_text(COLLECTING_POSITION, COLLECTING_TEXT));

        let lines = canvas.lines();
        assert_eq!(lines.len(), 3);
        // Segments are connected end to start, oldest first
        for pair in lines.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert_eq!(lines[0].0.x, 36);
        assert_eq!(lines[2].1.x, 36 + 89);
    }
}
