//! Simulated SCD4x bus for tests and the desktop simulator.
//!
//! [`SimulatedScd4x`] implements [`BusTransport`] and answers the four
//! commands the driver uses the way the real sensor does, including CRC
//! bytes. Faults are injected deterministically: transport failures,
//! corrupted response words, extended "not ready" periods, a missing sensor
//! and extra devices on the bus for scans.
//!
//! [`VirtualDelay`] is a [`DelayNs`] that only counts time, so tests can
//! check the driver's settle and response waits without sleeping.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::bus::BusTransport;
use crate::crc::{WORD_LEN, encode_word};
use crate::scd4x::{Command, SCD4X_ADDRESS};

/// Maximum number of extra devices on the simulated bus
pub const MAX_EXTRA_DEVICES: usize = 8;

/// Data-ready status word with new data available
const STATUS_READY: u16 = 0x8006;

/// Data-ready status word without new data. Bit 15 is set on purpose: only
/// bits 0..=10 carry the ready flag.
const STATUS_NOT_READY: u16 = 0x8000;

/// One-shot fault injected into the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The next transmit fails
    Transmit,
    /// The next receive fails
    Receive,
    /// The next response has the CRC of the given word flipped
    CorruptWord(usize),
}

/// Error returned by the simulated transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// No device at the addressed location
    NoAcknowledge,
    /// Fault injected with [`SimulatedScd4x::inject`]
    Injected,
    /// Receive without a preceding read command
    NoPendingResponse,
}

/// Raw measurement words served by the simulated sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMeasurement {
    pub co2: u16,
    pub temperature: u16,
    pub humidity: u16,
}

impl Default for RawMeasurement {
    /// 600 ppm, ≈21.4 °C, ≈45 %RH
    fn default() -> Self {
        Self {
            co2: 600,
            temperature: 24_400,
            humidity: 29_500,
        }
    }
}

/// In-memory SCD4x on a simulated bus.
#[derive(Debug)]
pub struct SimulatedScd4x {
    present: bool,
    extra_devices: Vec<u8, MAX_EXTRA_DEVICES>,
    sampling: bool,
    measurement: RawMeasurement,
    sample_interval: u32,
    not_ready_remaining: u32,
    pending: Option<Command>,
    fault: Option<(Fault, u32)>,
    acquired: bool,
    acquisitions: u32,
    unguarded_transfers: u32,
    command_counts: [u32; Command::ALL.len()],
    last_probe_timeout_ms: Option<u32>,
}

impl Default for SimulatedScd4x {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedScd4x {
    /// A present, idle sensor that has data ready on every poll once started.
    pub fn new() -> Self {
        Self {
            present: true,
            extra_devices: Vec::new(),
            sampling: false,
            measurement: RawMeasurement::default(),
            sample_interval: 0,
            not_ready_remaining: 0,
            pending: None,
            fault: None,
            acquired: false,
            acquisitions: 0,
            unguarded_transfers: 0,
            command_counts: [0; Command::ALL.len()],
            last_probe_timeout_ms: None,
        }
    }

    /// Connect or disconnect the sensor.
    pub fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    /// Put another device on the bus. Ignored once the bus is full.
    pub fn add_device(&mut self, address: u8) {
        let _ = self.extra_devices.push(address);
    }

    /// Set the raw words returned by the next measurement reads.
    pub fn set_measurement(&mut self, co2: u16, temperature: u16, humidity: u16) {
        self.measurement = RawMeasurement {
            co2,
            temperature,
            humidity,
        };
    }

    /// Produce a new sample every `polls` data-ready queries.
    ///
    /// Zero or one means every query reports data ready.
    pub fn set_sample_interval(&mut self, polls: u32) {
        self.sample_interval = polls;
    }

    /// Report "not ready" for the next `polls` data-ready queries.
    pub fn hold_not_ready(&mut self, polls: u32) {
        self.not_ready_remaining = polls;
    }

    /// Arm a one-shot fault on the next matching transfer.
    pub fn inject(&mut self, fault: Fault) {
        self.inject_after(0, fault);
    }

    /// Arm a one-shot fault, letting `skip` matching transfers pass first.
    pub fn inject_after(&mut self, skip: u32, fault: Fault) {
        self.fault = Some((fault, skip));
    }

    /// Whether the sensor is in periodic measurement mode
    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    /// Whether the bus is currently held
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Number of times the bus was acquired
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    /// Transfers performed while the bus was not acquired
    pub fn unguarded_transfers(&self) -> u32 {
        self.unguarded_transfers
    }

    /// Number of times `command` was received by the sensor
    pub fn command_count(&self, command: Command) -> u32 {
        Command::ALL
            .iter()
            .position(|c| *c == command)
            .map_or(0, |i| self.command_counts[i])
    }

    /// Timeout passed to the most recent probe
    pub fn last_probe_timeout_ms(&self) -> Option<u32> {
        self.last_probe_timeout_ms
    }

    fn has_device(&self, address: u8) -> bool {
        (self.present && address == SCD4X_ADDRESS) || self.extra_devices.contains(&address)
    }

    /// Consume the armed fault if it matches this transfer.
    fn take_fault(&mut self, matches: impl Fn(Fault) -> bool) -> Option<Fault> {
        let (fault, skip) = self.fault?;
        if !matches(fault) {
            return None;
        }
        if skip > 0 {
            self.fault = Some((fault, skip - 1));
            return None;
        }
        self.fault = None;
        Some(fault)
    }

    fn note_transfer(&mut self) {
        if !self.acquired {
            self.unguarded_transfers += 1;
        }
    }

    fn data_ready(&mut self) -> bool {
        if !self.sampling {
            return false;
        }
        if self.not_ready_remaining > 0 {
            self.not_ready_remaining -= 1;
            return false;
        }
        true
    }

    fn execute(&mut self, command: Command) {
        if let Some(i) = Command::ALL.iter().position(|c| *c == command) {
            self.command_counts[i] += 1;
        }

        match command {
            Command::StartPeriodicMeasurement => {
                self.sampling = true;
                self.not_ready_remaining = self.sample_interval.saturating_sub(1);
                self.pending = None;
            }
            Command::StopPeriodicMeasurement => {
                self.sampling = false;
                self.pending = None;
            }
            Command::ReadMeasurement | Command::GetDataReadyStatus => {
                self.pending = Some(command);
            }
        }
    }

    fn respond(&mut self, command: Command, buffer: &mut [u8]) {
        let mut response = [0u8; 3 * WORD_LEN];
        let words = match command {
            Command::GetDataReadyStatus => {
                let status = if self.data_ready() {
                    STATUS_READY
                } else {
                    STATUS_NOT_READY
                };
                response[..WORD_LEN].copy_from_slice(&encode_word(status));
                1
            }
            Command::ReadMeasurement => {
                let RawMeasurement {
                    co2,
                    temperature,
                    humidity,
                } = self.measurement;
                for (chunk, value) in response
                    .chunks_exact_mut(WORD_LEN)
                    .zip([co2, temperature, humidity])
                {
                    chunk.copy_from_slice(&encode_word(value));
                }
                self.not_ready_remaining = self.sample_interval.saturating_sub(1);
                3
            }
            _ => 0,
        };

        if let Some(Fault::CorruptWord(word)) =
            self.take_fault(|f| matches!(f, Fault::CorruptWord(_)))
            && word < words
        {
            response[word * WORD_LEN + 2] ^= 0xFF;
        }

        let len = buffer.len().min(words * WORD_LEN);
        buffer[..len].copy_from_slice(&response[..len]);
    }
}

impl BusTransport for SimulatedScd4x {
    type Error = SimError;

    fn acquire(&mut self) {
        self.acquired = true;
        self.acquisitions += 1;
    }

    fn release(&mut self) {
        self.acquired = false;
    }

    fn probe(&mut self, address: u8, timeout_ms: u32) -> bool {
        self.note_transfer();
        self.last_probe_timeout_ms = Some(timeout_ms);
        self.has_device(address)
    }

    fn transmit(&mut self, address: u8, bytes: &[u8], _timeout_ms: u32) -> Result<(), SimError> {
        self.note_transfer();
        if self.take_fault(|f| f == Fault::Transmit).is_some() {
            return Err(SimError::Injected);
        }
        if !self.has_device(address) {
            return Err(SimError::NoAcknowledge);
        }
        if address != SCD4X_ADDRESS {
            return Ok(());
        }

        if let &[hi, lo] = bytes
            && let Some(command) = Command::from_be_bytes([hi, lo])
        {
            self.execute(command);
        }

        Ok(())
    }

    fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), SimError> {
        self.note_transfer();
        if self.take_fault(|f| f == Fault::Receive).is_some() {
            return Err(SimError::Injected);
        }
        if !self.has_device(address) {
            return Err(SimError::NoAcknowledge);
        }

        let command = self.pending.take().ok_or(SimError::NoPendingResponse)?;
        self.respond(command, buffer);

        Ok(())
    }
}

/// Delay that records elapsed time instead of sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualDelay {
    elapsed_ns: u64,
}

impl VirtualDelay {
    pub const fn new() -> Self {
        Self { elapsed_ns: 0 }
    }

    /// Total time waited so far, in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}
