//! AHT10 Sensor Driver for Embedded Rust
//!
//! This crate provides a bare-metal driver for the AHT10 temperature and
//! humidity sensor, split into a register-level I2C transaction engine and a
//! small protocol layer that sequences the sensor's commands and decodes its
//! 6-byte response frame into fixed-point readings.
//!
//! # Features
//! - Blocking synchronous API, every wait point timeout-guarded
//! - Designed for `no_std` environments, no allocation
//! - Hardware access injected through the [`BusRegisters`] trait, so the
//!   driver runs against a real peripheral or a simulated bus
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`DelayNs`] for the sensor's fixed settling delays
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

pub mod aht10;
pub mod bus;
pub mod error;

pub use aht10::{Aht10, Reading, decode_frame};
pub use bus::{BusRegisters, I2cBus, POLL_BUDGET};
pub use error::{Aht10Error, BusError};
