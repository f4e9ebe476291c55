//! Sensirion SCD4x CO2 / temperature / humidity driver
//!
//! Implements the subset of the SCD4x I2C protocol used by the monitor:
//! periodic measurement start/stop, data-ready polling, measurement readout
//! and a diagnostic bus scan.
//!
//! # Wire format
//!
//! Commands are 16-bit big-endian words with no payload. Responses are
//! sequences of 3-byte groups: two big-endian data bytes followed by their
//! CRC-8 (see [`crate::crc`]).
//!
//! # Modes
//!
//! The sensor keeps its own mode across calls. The driver mirrors it in
//! [`SensorMode`] for diagnostics only and never refuses a command because of
//! it:
//!
//! ```text
//! Idle --start_periodic_measurement--> Sampling --stop_periodic_measurement--> Idle
//! ```
//!
//! While sampling, the sensor produces a new sample roughly every 5 seconds.
//! [`Scd4x::read_measurement`] returns [`Error::NotReady`] until it does.
//!
//! The driver never retries. Every operation returns on the first fault and
//! leaves retry timing to the caller's poll cadence.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::bus::{BusGuard, BusTransport};
use crate::crc::{self, WORD_LEN};

/// Fixed 7-bit I2C address of the SCD4x
pub const SCD4X_ADDRESS: u8 = 0x62;

/// First 7-bit address probed by [`Scd4x::scan_bus`]
pub const SCAN_FIRST_ADDRESS: u8 = 0x03;

/// Last 7-bit address probed by [`Scd4x::scan_bus`]
pub const SCAN_LAST_ADDRESS: u8 = 0x77;

/// Settle time before the first command after power-up
const POWER_UP_DELAY_MS: u32 = 30;

/// Time the sensor needs after `stop_periodic_measurement` before it accepts
/// new commands
const STOP_SETTLE_DELAY_MS: u32 = 500;

/// Delay between a read command and fetching its response
const RESPONSE_DELAY_MS: u32 = 2;

/// Timeout for command/response transfers and the start-up presence probe
const TRANSFER_TIMEOUT_MS: u32 = 50;

/// Per-address probe timeout during a bus scan
const SCAN_PROBE_TIMEOUT_MS: u32 = 20;

/// Pause between scan probes to avoid flooding the bus
const SCAN_PROBE_INTERVAL_MS: u32 = 1;

/// Any of bits 0..=10 set in the data-ready status word means data is ready
const DATA_READY_MASK: u16 = 0x07FF;

/// Measurement response length: CO2, temperature, humidity words
const MEASUREMENT_LEN: usize = 3 * WORD_LEN;

/// SCD4x command words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Command {
    StartPeriodicMeasurement = 0x21B1,
    StopPeriodicMeasurement = 0x3F86,
    ReadMeasurement = 0xEC05,
    GetDataReadyStatus = 0xE4B8,
}

impl Command {
    /// All commands known to the driver
    pub const ALL: [Command; 4] = [
        Command::StartPeriodicMeasurement,
        Command::StopPeriodicMeasurement,
        Command::ReadMeasurement,
        Command::GetDataReadyStatus,
    ];

    /// Raw 16-bit command code
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Command as transmitted on the wire (big-endian)
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.code().to_be_bytes()
    }

    /// Decode a command word received on the wire
    pub fn from_be_bytes(bytes: [u8; 2]) -> Option<Self> {
        let code = u16::from_be_bytes(bytes);
        Self::ALL.into_iter().find(|command| command.code() == code)
    }
}

/// Why a bus exchange failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusFault {
    /// No device acknowledged the sensor address
    #[error("no device acknowledged the sensor address")]
    NotPresent,
    /// Transmitting a command failed
    #[error("transmit failed")]
    Transmit,
    /// Receiving a response failed
    #[error("receive failed")]
    Receive,
}

/// Errors returned by the SCD4x driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid argument or internal misuse
    #[error("invalid argument")]
    Generic,
    /// Device absent or a transfer failed at the transport level
    #[error("I2C bus error: {0}")]
    Bus(BusFault),
    /// A received word's checksum did not match
    #[error("checksum mismatch in response word {word}")]
    Checksum {
        /// Index of the offending word within the response
        word: usize,
    },
    /// The sensor has not produced a fresh sample yet. Expected, not a fault.
    #[error("measurement not ready")]
    NotReady,
}

impl Error {
    /// Numeric status code, as shown to the user in error messages.
    pub const fn code(self) -> i8 {
        Status::from_error(self).code()
    }
}

/// Flat status code view of a driver result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    GenericError,
    BusError,
    ChecksumError,
    NotReady,
}

impl Status {
    /// Status for a failed operation
    pub const fn from_error(error: Error) -> Self {
        match error {
            Error::Generic => Self::GenericError,
            Error::Bus(_) => Self::BusError,
            Error::Checksum { .. } => Self::ChecksumError,
            Error::NotReady => Self::NotReady,
        }
    }

    /// Numeric code: 0 for `Ok`, negative for everything else.
    pub const fn code(self) -> i8 {
        match self {
            Self::Ok => 0,
            Self::GenericError => -1,
            Self::BusError => -2,
            Self::ChecksumError => -3,
            Self::NotReady => -4,
        }
    }
}

impl<T> From<&Result<T, Error>> for Status {
    fn from(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => Self::from_error(*e),
        }
    }
}

/// One decoded measurement.
///
/// Temperature and humidity are fixed-point with two decimals (×100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reading {
    /// CO2 concentration in ppm
    pub co2_ppm: u16,
    /// Temperature in °C × 100
    pub temp_c_x100: i16,
    /// Relative humidity in % × 100
    pub rh_x100: i16,
}

impl Reading {
    /// Decode the three raw measurement words.
    pub const fn from_raw(co2: u16, temperature: u16, humidity: u16) -> Self {
        Self {
            co2_ppm: co2,
            temp_c_x100: temperature_c_x100(temperature),
            rh_x100: humidity_x100(humidity),
        }
    }
}

/// T [°C] = −45 + 175 × raw / 65536, as °C × 100.
///
/// The scaled term is truncated before the −45.00 °C offset is added, so
/// sub-zero results are one step lower than a truncation of the whole sum.
pub const fn temperature_c_x100(raw: u16) -> i16 {
    (-4500 + 17500_i64 * raw as i64 / 65536) as i16
}

/// RH [%] = 100 × raw / 65536, as % × 100 truncated toward zero.
pub const fn humidity_x100(raw: u16) -> i16 {
    ((10000_i64 * raw as i64) / 65536) as i16
}

/// Sensor mode as last commanded by this driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMode {
    Idle,
    Sampling,
}

/// Outcome of a bus scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult<const N: usize> {
    /// First `N` responding addresses, in ascending order
    pub addresses: Vec<u8, N>,
    /// Total number of responding addresses, including ones not stored
    pub found: usize,
}

impl<const N: usize> ScanResult<N> {
    /// True when more devices answered than could be stored.
    pub fn is_truncated(&self) -> bool {
        self.found > self.addresses.len()
    }
}

/// SCD4x driver over a [`BusTransport`] and a blocking delay.
pub struct Scd4x<B, D> {
    bus: B,
    delay: D,
    address: u8,
    mode: SensorMode,
}

impl<B: BusTransport, D: DelayNs> Scd4x<B, D> {
    /// Create a driver for a sensor at the standard address.
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_address(bus, delay, SCD4X_ADDRESS)
    }

    /// Create a driver for a sensor at a non-standard address.
    pub fn with_address(bus: B, delay: D, address: u8) -> Self {
        Self {
            bus,
            delay,
            address,
            mode: SensorMode::Idle,
        }
    }

    /// Address the driver talks to
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Mode as last commanded by this driver
    pub fn mode(&self) -> SensorMode {
        self.mode
    }

    /// Mutable access to the transport, e.g. for other diagnostics.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Tear the driver down and return the transport and delay.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Start periodic measurement.
    ///
    /// Waits for the power-up settle time, checks the sensor acknowledges its
    /// address, then sends the start command. Does not wait for first data.
    pub fn start_periodic_measurement(&mut self) -> Result<(), Error> {
        self.delay.delay_ms(POWER_UP_DELAY_MS);

        let present = {
            let mut bus = BusGuard::acquire(&mut self.bus);
            bus.probe(self.address, TRANSFER_TIMEOUT_MS)
        };
        if !present {
            error!("SCD4x: no device at 0x{:02X}", self.address);
            return Err(Error::Bus(BusFault::NotPresent));
        }

        self.write_command(Command::StartPeriodicMeasurement)?;
        self.mode = SensorMode::Sampling;
        info!("SCD4x: periodic measurement started");

        Ok(())
    }

    /// Stop periodic measurement.
    ///
    /// Always waits for the stop settle time, even if the command failed, and
    /// then returns the outcome of the command.
    pub fn stop_periodic_measurement(&mut self) -> Result<(), Error> {
        let result = self.write_command(Command::StopPeriodicMeasurement);
        self.delay.delay_ms(STOP_SETTLE_DELAY_MS);

        if result.is_ok() {
            self.mode = SensorMode::Idle;
            info!("SCD4x: periodic measurement stopped");
        }

        result
    }

    /// Query whether a new measurement is available.
    pub fn data_ready(&mut self) -> Result<bool, Error> {
        let mut rx = [0u8; WORD_LEN];
        self.read_response(Command::GetDataReadyStatus, &mut rx)?;

        let status = crc::check_word(&rx).ok_or_else(|| {
            error!("SCD4x: data-ready status checksum mismatch");
            Error::Checksum { word: 0 }
        })?;

        Ok(status & DATA_READY_MASK != 0)
    }

    /// Read the latest measurement.
    ///
    /// Returns [`Error::NotReady`] without touching the measurement buffer
    /// when the sensor has no new sample, so a not-ready poll never consumes
    /// sensor state.
    pub fn read_measurement(&mut self) -> Result<Reading, Error> {
        if !self.data_ready()? {
            debug!("SCD4x: measurement not ready");
            return Err(Error::NotReady);
        }

        let mut rx = [0u8; MEASUREMENT_LEN];
        self.read_response(Command::ReadMeasurement, &mut rx)?;

        let mut words = [0u16; 3];
        for (word, (chunk, value)) in rx.chunks_exact(WORD_LEN).zip(&mut words).enumerate() {
            *value = crc::check_word(chunk).ok_or_else(|| {
                error!("SCD4x: measurement word {} checksum mismatch", word);
                Error::Checksum { word }
            })?;
        }

        let [co2, temperature, humidity] = words;
        let reading = Reading::from_raw(co2, temperature, humidity);
        debug!(
            "SCD4x: co2={}ppm t={} rh={}",
            reading.co2_ppm, reading.temp_c_x100, reading.rh_x100
        );

        Ok(reading)
    }

    /// Scan the bus for responding devices, keeping up to `N` addresses.
    ///
    /// Zero devices found is a valid result, distinct from a bus fault.
    pub fn scan_bus<const N: usize>(&mut self) -> Result<ScanResult<N>, Error> {
        let mut buffer = [0u8; N];
        let found = self.scan_bus_into(&mut buffer)?;

        let stored = found.min(N);
        let mut addresses = Vec::new();
        // `stored <= N`, so this never overflows.
        let _ = addresses.extend_from_slice(&buffer[..stored]);

        Ok(ScanResult { addresses, found })
    }

    /// Scan the bus, storing up to `addresses.len()` responding addresses.
    ///
    /// Returns the total number of devices that answered, which may exceed
    /// the slice length. An empty slice is rejected with [`Error::Generic`].
    pub fn scan_bus_into(&mut self, addresses: &mut [u8]) -> Result<usize, Error> {
        if addresses.is_empty() {
            return Err(Error::Generic);
        }

        let mut found = 0;
        {
            let mut bus = BusGuard::acquire(&mut self.bus);
            for address in SCAN_FIRST_ADDRESS..=SCAN_LAST_ADDRESS {
                if bus.probe(address, SCAN_PROBE_TIMEOUT_MS) {
                    if let Some(slot) = addresses.get_mut(found) {
                        *slot = address;
                    }
                    found += 1;
                }
                self.delay.delay_ms(SCAN_PROBE_INTERVAL_MS);
            }
        }

        for address in &addresses[..found.min(addresses.len())] {
            info!("I2C device at 0x{:02X}", address);
        }
        if found == 0 {
            warn!("No I2C devices responded on the bus");
        }

        Ok(found)
    }

    fn write_command(&mut self, command: Command) -> Result<(), Error> {
        let mut bus = BusGuard::acquire(&mut self.bus);
        bus.transmit(self.address, &command.to_be_bytes(), TRANSFER_TIMEOUT_MS)
            .map_err(|e| {
                error!("SCD4x: {:?} transmit failed: {:?}", command, e);
                Error::Bus(BusFault::Transmit)
            })
    }

    fn read_response(&mut self, command: Command, rx: &mut [u8]) -> Result<(), Error> {
        let mut bus = BusGuard::acquire(&mut self.bus);
        bus.transmit(self.address, &command.to_be_bytes(), TRANSFER_TIMEOUT_MS)
            .map_err(|e| {
                error!("SCD4x: {:?} transmit failed: {:?}", command, e);
                Error::Bus(BusFault::Transmit)
            })?;

        self.delay.delay_ms(RESPONSE_DELAY_MS);

        bus.receive(self.address, rx, TRANSFER_TIMEOUT_MS)
            .map_err(|e| {
                error!("SCD4x: {:?} receive failed: {:?}", command, e);
                Error::Bus(BusFault::Receive)
            })
    }
}
