//! Hardware-independent core library for the SCD4x CO2 monitor
//!
//! This crate contains all platform-agnostic logic for the monitor: the
//! SCD4x I2C protocol driver, the rolling CO2 sample history, the readout and
//! graph renderer, and the poll loop that ties them together.
//!
//! It is `#![no_std]` so it compiles on embedded targets and on desktop hosts
//! (for the simulator and tests). All bus access goes through the
//! [`bus::BusTransport`] trait and all drawing through the [`ui::Canvas`]
//! trait, so the same code runs against real hardware or the simulated
//! sensor in [`sim`].

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod crc;
pub mod framebuffer;
pub mod history;
pub mod monitor;
pub mod scd4x;
pub mod shared_bus;
pub mod sim;
pub mod ui;
