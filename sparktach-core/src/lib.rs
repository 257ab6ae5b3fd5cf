//! Board-agnostic core logic for the Sparktach tachometer and timing light
//!
//! This crate contains everything that does not touch hardware:
//!
//! - Timing engine: edge filtering, revolution period, spark advance
//! - Telemetry publisher with stall detection
//! - Configuration types, the `engine.toml` reader and the persisted
//!   settings record
//! - Traits for the telemetry sink and tick source
//!
//! The edge handlers are plain functions of a timestamp, so the whole
//! engine runs on the host under test.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod telemetry;
pub mod timing;
pub mod traits;
