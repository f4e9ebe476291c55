//! Monitor poll loop
//!
//! [`Monitor`] is the application state: the sensor driver, the CO2 history,
//! the latest reading and a short status line. The platform calls
//! [`Monitor::start`] once, [`Monitor::poll`] on every timer tick and
//! [`Monitor::render`] whenever the screen needs redrawing. No error is
//! fatal; a failed tick is simply retried on the next one.

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;
use heapless::String;
use log::{debug, info, warn};

use crate::bus::BusTransport;
use crate::config::{MAX_SCAN_CAPACITY, MonitorConfig};
use crate::history::{CO2_HISTORY_LEN, History};
use crate::scd4x::{Error, Reading, Scd4x, Status};
use crate::ui::{Canvas, MonitorView, draw_screen};

/// Capacity of the status line
pub const MAX_STATUS_LENGTH: usize = 32;

pub type StatusText = String<MAX_STATUS_LENGTH>;

const STARTING_STATUS: &str = "Starting...";
const WARMING_UP_STATUS: &str = "Warming up...";
const WAITING_STATUS: &str = "Waiting...";
const BUS_ERROR_STATUS: &str = "I2C error (no ACK?)";
const NO_DEVICES_STATUS: &str = "I2C: none (no pullups?)";

/// Sensor, history and status shown on screen.
pub struct Monitor<B, D> {
    sensor: Scd4x<B, D>,
    config: MonitorConfig,
    history: History<CO2_HISTORY_LEN>,
    reading: Reading,
    status: StatusText,
    sensor_ok: bool,
}

impl<B: BusTransport, D: DelayNs> Monitor<B, D> {
    /// Monitor with the default configuration.
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_config(bus, delay, MonitorConfig::default())
    }

    pub fn with_config(bus: B, delay: D, config: MonitorConfig) -> Self {
        let mut status = String::new();
        let _ = status.push_str(STARTING_STATUS);

        Self {
            sensor: Scd4x::with_address(bus, delay, config.sensor_address),
            config,
            history: History::new(),
            reading: Reading::default(),
            status,
            sensor_ok: false,
        }
    }

    /// Start periodic measurement.
    ///
    /// When the sensor does not answer, the bus is scanned and the status
    /// line reports what was found instead.
    pub fn start(&mut self) -> Status {
        let result = self.sensor.start_periodic_measurement();

        match result {
            Ok(()) => {
                self.sensor_ok = true;
                self.set_status(format_args!("{}", WARMING_UP_STATUS));
            }
            Err(Error::Bus(fault)) => {
                warn!("Sensor start failed ({}), scanning bus", fault);
                self.sensor_ok = false;
                self.report_scan();
            }
            Err(e) => {
                self.sensor_ok = false;
                self.set_status(format_args!("Init failed ({})", e.code()));
            }
        }

        Status::from(&result)
    }

    /// One timer tick: read the sensor and update state.
    pub fn poll(&mut self) -> Status {
        let result = self.sensor.read_measurement();

        match result {
            Ok(reading) => {
                if !self.sensor_ok {
                    info!("Sensor recovered");
                }
                self.sensor_ok = true;
                self.reading = reading;
                self.status.clear();
                self.history.push(reading.co2_ppm);
            }
            Err(Error::NotReady) => {
                self.sensor_ok = true;
                self.set_status(format_args!("{}", WAITING_STATUS));
            }
            Err(Error::Bus(_)) => {
                self.sensor_ok = false;
                self.set_status(format_args!("{}", BUS_ERROR_STATUS));
            }
            Err(e) => {
                self.sensor_ok = false;
                self.set_status(format_args!("Sensor error ({})", e.code()));
            }
        }

        Status::from(&result)
    }

    /// Snapshot of everything the screen shows
    pub fn view(&self) -> MonitorView<'_, CO2_HISTORY_LEN> {
        MonitorView {
            reading: self.reading,
            status: &self.status,
            sensor_ok: self.sensor_ok,
            history: &self.history,
        }
    }

    pub fn render<C: Canvas>(&self, canvas: &mut C) -> Result<(), C::Error> {
        draw_screen(canvas, &self.view())
    }

    pub fn history(&self) -> &History<CO2_HISTORY_LEN> {
        &self.history
    }

    /// Latest successful reading, all zeros before the first one
    pub fn reading(&self) -> Reading {
        self.reading
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_sensor_ok(&self) -> bool {
        self.sensor_ok
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.config.poll_interval_ms
    }

    /// Mutable access to the transport, e.g. to feed a simulated sensor.
    pub fn transport_mut(&mut self) -> &mut B {
        self.sensor.bus_mut()
    }

    /// Stop periodic measurement and hand back the transport and delay.
    ///
    /// The caller stops its poll timer first; the stop command is the last
    /// bus operation.
    pub fn shutdown(mut self) -> (B, D) {
        if let Err(e) = self.sensor.stop_periodic_measurement() {
            warn!("Failed to stop periodic measurement: {}", e);
        }
        self.sensor.release()
    }

    fn report_scan(&mut self) {
        let mut buffer = [0u8; MAX_SCAN_CAPACITY as usize];
        let capacity = usize::from(self.config.scan_capacity).clamp(1, buffer.len());
        let wanted = self.sensor.address();

        let found = match self.sensor.scan_bus_into(&mut buffer[..capacity]) {
            Ok(found) => found,
            Err(e) => {
                warn!("Bus scan failed: {}", e);
                self.set_status(format_args!("No I2C device at 0x{:02X}", wanted));
                return;
            }
        };

        debug!("Bus scan found {} device(s)", found);
        match &buffer[..found.min(capacity)] {
            [] => self.set_status(format_args!("{}", NO_DEVICES_STATUS)),
            [first, second, ..] => self.set_status(format_args!(
                "I2C: 0x{:02X} 0x{:02X} (need 0x{:02X})",
                first, second, wanted
            )),
            [first] => self.set_status(format_args!(
                "I2C found: 0x{:02X} (need 0x{:02X})",
                first, wanted
            )),
        }
    }

    /// Replace the status line, truncating at capacity.
    fn set_status(&mut self, args: fmt::Arguments<'_>) {
        self.status.clear();
        let _ = self.status.write_fmt(args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scd4x::Command;
    use crate::sim::{Fault, SimulatedScd4x, VirtualDelay};

    fn monitor() -> Monitor<SimulatedScd4x, VirtualDelay> {
        Monitor::new(SimulatedScd4x::new(), VirtualDelay::new())
    }

    #[test]
    fn test_new_monitor_is_starting() {
        let monitor = monitor();
        assert_eq!(monitor.status(), "Starting...");
        assert!(!monitor.is_sensor_ok());
        assert!(monitor.history().is_empty());
        assert_eq!(monitor.poll_interval_ms(), 1000);
    }

    #[test]
    fn test_start_ok_warms_up() {
        let mut monitor = monitor();
        assert_eq!(monitor.start(), Status::Ok);
        assert!(monitor.is_sensor_ok());
        assert_eq!(monitor.status(), "Warming up...");
    }

    #[test]
    fn test_start_without_sensor_reports_scan() {
        let mut sim = SimulatedScd4x::new();
        sim.set_present(false);
        let mut monitor = Monitor::new(sim, VirtualDelay::new());

        assert_eq!(monitor.start(), Status::BusError);
        assert!(!monitor.is_sensor_ok());
        assert_eq!(monitor.status(), "I2C: none (no pullups?)");
    }

    #[test]
    fn test_start_scan_reports_one_or_two_addresses() {
        let mut sim = SimulatedScd4x::new();
        sim.set_present(false);
        sim.add_device(0x3C);
        let mut monitor = Monitor::new(sim, VirtualDelay::new());
        monitor.start();
        assert_eq!(monitor.status(), "I2C found: 0x3C (need 0x62)");

        let mut sim = SimulatedScd4x::new();
        sim.set_present(false);
        sim.add_device(0x48);
        sim.add_device(0x3C);
        sim.add_device(0x50);
        let mut monitor = Monitor::new(sim, VirtualDelay::new());
        monitor.start();
        // Lowest addresses first
        assert_eq!(monitor.status(), "I2C: 0x3C 0x48 (need 0x62)");
    }

    #[test]
    fn test_start_command_failure_also_scans() {
        let mut sim = SimulatedScd4x::new();
        sim.inject(Fault::Transmit);
        let mut monitor = Monitor::new(sim, VirtualDelay::new());

        assert_eq!(monitor.start(), Status::BusError);
        assert_eq!(monitor.status(), "I2C found: 0x62 (need 0x62)");
    }

    #[test]
    fn test_poll_updates_state_per_status() {
        let mut monitor = monitor();
        monitor.start();
        monitor.transport_mut().hold_not_ready(1);

        assert_eq!(monitor.poll(), Status::NotReady);
        assert!(monitor.is_sensor_ok());
        assert_eq!(monitor.status(), "Waiting...");
        assert!(monitor.history().is_empty());

        assert_eq!(monitor.poll(), Status::Ok);
        assert_eq!(monitor.status(), "");
        assert_eq!(monitor.reading().co2_ppm, 600);
        assert_eq!(monitor.history().latest(), Some(600));

        monitor.transport_mut().inject(Fault::Receive);
        assert_eq!(monitor.poll(), Status::BusError);
        assert!(!monitor.is_sensor_ok());
        assert_eq!(monitor.status(), "I2C error (no ACK?)");
        // Last good reading is kept
        assert_eq!(monitor.reading().co2_ppm, 600);

        monitor.transport_mut().inject_after(1, Fault::CorruptWord(2));
        assert_eq!(monitor.poll(), Status::ChecksumError);
        assert!(!monitor.is_sensor_ok());
        assert_eq!(monitor.status(), "Sensor error (-3)");
        assert_eq!(monitor.history().len(), 1);

        assert_eq!(monitor.poll(), Status::Ok);
        assert!(monitor.is_sensor_ok());
        assert_eq!(monitor.history().len(), 2);
    }

    #[test]
    fn test_shutdown_stops_measurement() {
        let mut monitor = monitor();
        monitor.start();
        let (sim, delay) = monitor.shutdown();

        assert!(!sim.is_sampling());
        assert_eq!(sim.command_count(Command::StopPeriodicMeasurement), 1);
        assert!(!sim.is_acquired());
        // Power-up settle plus stop settle
        assert_eq!(delay.elapsed_ms(), 30 + 500);
    }

    #[test]
    fn test_configured_scan_capacity_limits_status() {
        let mut sim = SimulatedScd4x::new();
        sim.set_present(false);
        sim.add_device(0x3C);
        sim.add_device(0x48);
        let config = MonitorConfig {
            scan_capacity: 1,
            ..MonitorConfig::default()
        };
        let mut monitor = Monitor::with_config(sim, VirtualDelay::new(), config);
        monitor.start();
        assert_eq!(monitor.status(), "I2C found: 0x3C (need 0x62)");
    }
}
