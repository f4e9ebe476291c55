//! Terminal simulator for the SCD4x CO2 monitor.
//!
//! Runs the core [`Monitor`] against the simulated sensor bus from
//! `co2_core::sim`, feeding it synthetic readings, and prints the 128×64
//! screen to the terminal on every tick. Faults can be injected from the
//! command line to exercise the error screens.
//!
//! ```text
//! co2-simulator --ticks 60 --interval-ms 200
//! co2-simulator --absent --extra-device 0x3C
//! RUST_LOG=debug co2-simulator --corrupt-every 7
//! ```

mod terminal;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use co2_core::config::{MAX_ENCODED_LEN, MonitorConfig};
use co2_core::framebuffer::FrameBuffer;
use co2_core::monitor::Monitor;
use co2_core::scd4x::Status;
use co2_core::sim::{Fault, SimulatedScd4x};
use co2_core::ui::GraphicsCanvas;

use terminal::TerminalDisplay;

/// Data-ready queries between fresh samples, about the sensor's 5 s period
/// at the default 1 s poll.
const SAMPLE_INTERVAL_POLLS: u32 = 5;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Stop after this many ticks (runs until Ctrl-C if omitted)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the poll interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u32>,

    /// Postcard-encoded configuration blob to load
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration blob to this path and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Simulate a missing sensor
    #[arg(long)]
    absent: bool,

    /// Put another device on the bus (repeatable, e.g. 0x3C)
    #[arg(long = "extra-device", value_parser = parse_address)]
    extra_devices: Vec<u8>,

    /// Corrupt a response checksum every N ticks
    #[arg(long)]
    corrupt_every: Option<u64>,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(address) if address <= 0x7F => Ok(address),
        _ => Err(format!("`{s}` is not a 7-bit I2C address")),
    }
}

/// Resolve the configuration from the optional blob and command-line
/// overrides.
fn load_config(cli: &Cli) -> MonitorConfig {
    let mut config = match &cli.config {
        Some(path) => match fs::read(path) {
            Ok(bytes) => MonitorConfig::from_bytes(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring {}: {}", path.display(), e);
                MonitorConfig::default()
            }),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                MonitorConfig::default()
            }
        },
        None => MonitorConfig::default(),
    };

    if let Some(interval_ms) = cli.interval_ms {
        if interval_ms == 0 {
            warn!(
                "Poll interval must be non-zero, keeping {} ms",
                config.poll_interval_ms
            );
        } else {
            config.poll_interval_ms = interval_ms;
        }
    }

    config
}

fn save_config(config: &MonitorConfig, path: &Path) {
    let mut buffer = [0u8; MAX_ENCODED_LEN];
    let result = config
        .to_slice(&mut buffer)
        .map_err(|e| e.to_string())
        .and_then(|bytes| fs::write(path, bytes).map_err(|e| e.to_string()));

    match result {
        Ok(()) => info!("Configuration written to {}", path.display()),
        Err(e) => error!("Failed to write {}: {}", path.display(), e),
    }
}

// ---------------------------------------------------------------------------
// Platform glue
// ---------------------------------------------------------------------------

/// Whether the main loop should exit before polling `tick` again.
fn should_stop(ticks: Option<u64>, tick: u64, running: &AtomicBool) -> bool {
    !running.load(Ordering::SeqCst) || ticks.is_some_and(|ticks| tick >= ticks)
}

/// Flag cleared by Ctrl-C so the loop ends and the sensor is stopped.
fn install_interrupt_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst)) {
        warn!("Cannot install Ctrl-C handler: {}", e);
    }
    running
}

/// Blocking delay on the host thread
struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates synthetic raw sensor words that vary over time.
struct MockSensorGenerator {
    /// Seconds since start
    elapsed_secs: f64,
}

impl MockSensorGenerator {
    fn new() -> Self {
        Self { elapsed_secs: 0.0 }
    }

    /// Advance the clock and return raw (co2, temperature, humidity) words.
    fn next_raw(&mut self, dt_secs: f64) -> (u16, u16, u16) {
        self.elapsed_secs += dt_secs;
        let t = self.elapsed_secs;

        // CO₂: 500–900 ppm with a slow cycle
        let co2 = 700.0 + 200.0 * (t / 90.0).sin() + 25.0 * (t / 13.0).cos();

        // Temperature: 20–26 °C
        let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();

        // Humidity: 40–60 %
        let humidity = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();

        (
            co2 as u16,
            to_raw((temperature + 45.0) / 175.0),
            to_raw(humidity / 100.0),
        )
    }
}

/// Scale a 0..1 fraction to a 16-bit sensor word.
fn to_raw(fraction: f64) -> u16 {
    (fraction.clamp(0.0, 1.0) * 65535.0) as u16
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli);
    if let Some(path) = &cli.save_config {
        save_config(&config, path);
    }

    info!("Starting CO2 monitor simulator");
    info!(
        "Sensor 0x{:02X}, poll every {} ms",
        config.sensor_address, config.poll_interval_ms
    );

    let mut sensor = SimulatedScd4x::new();
    sensor.set_present(!cli.absent);
    sensor.set_sample_interval(SAMPLE_INTERVAL_POLLS);
    for &address in &cli.extra_devices {
        sensor.add_device(address);
    }

    let running = install_interrupt_flag();
    let mut monitor = Monitor::with_config(sensor, StdDelay, config);
    let mut framebuffer = FrameBuffer::new();
    let mut display = TerminalDisplay::new();
    let mut sensor_gen = MockSensorGenerator::new();

    let start_status = monitor.start();
    info!("Start: {:?} {}", start_status, monitor.status());

    let interval = Duration::from_millis(u64::from(monitor.poll_interval_ms()));
    let mut tick: u64 = 0;
    let mut first_frame = true;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    loop {
        let tick_start = Instant::now();

        // --- Render -------------------------------------------------------
        if let Err(e) = monitor.render(&mut GraphicsCanvas::new(&mut framebuffer)) {
            error!("Draw error: {:?}", e);
        }
        if let Err(e) = framebuffer.flush(&mut display) {
            error!("Flush error: {:?}", e);
        }
        if let Err(e) = display.present(first_frame) {
            error!("Terminal output failed: {}", e);
            break;
        }
        first_frame = false;

        if should_stop(cli.ticks, tick, &running) {
            break;
        }

        // --- Pacing -------------------------------------------------------
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
        tick += 1;

        // --- Mock sensor data ---------------------------------------------
        let (co2, temperature, humidity) = sensor_gen.next_raw(interval.as_secs_f64());
        let bus = monitor.transport_mut();
        bus.set_measurement(co2, temperature, humidity);
        if cli.corrupt_every.is_some_and(|n| n > 0 && tick % n == 0) {
            bus.inject(Fault::CorruptWord(0));
        }

        // --- Poll ---------------------------------------------------------
        match monitor.poll() {
            Status::Ok => info!(
                "Tick {}: {} ppm, {} °C×100, {} %RH×100",
                tick,
                monitor.reading().co2_ppm,
                monitor.reading().temp_c_x100,
                monitor.reading().rh_x100
            ),
            status => info!("Tick {}: {:?} {}", tick, status, monitor.status()),
        }
    }

    // Stop sampling as the last bus operation
    let _ = monitor.shutdown();
    info!("Simulator exiting");
}
