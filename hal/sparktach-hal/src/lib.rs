//! Sparktach Hardware Abstraction Layer
//!
//! Traits implemented by chip-specific HALs so the firmware logic does not
//! depend on one microcontroller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (sparktach-firmware)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sparktach-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ sparktach-hal-│
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`edge::EdgeInput`] - Wait for a configured signal transition
//! - [`flash::FlashStorage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod edge;
pub mod flash;

pub use edge::{EdgeInput, EdgeTrigger, TriggeredInput};
pub use flash::{FlashError, FlashStorage, StorageKey};
