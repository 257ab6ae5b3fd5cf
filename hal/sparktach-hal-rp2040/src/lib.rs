//! RP2040-specific HAL for the Sparktach firmware
//!
//! Implements the shared `sparktach-hal` traits for the RP2040:
//!
//! - Flash storage driver (implements `sparktach_hal::FlashStorage`)
//! - Config-driven GPIO allocation
//! - Edge-triggered sensor inputs

#![no_std]

pub mod edge;
pub mod flash;
pub mod pins;

// Re-export shared traits from sparktach-hal for convenience
pub use sparktach_hal::{EdgeInput, EdgeTrigger, FlashStorage as FlashStorageTrait, StorageKey};
