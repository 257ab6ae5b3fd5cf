//! Sparktach link protocol
//!
//! Binary frames exchanged over UART with the network bridge, which owns
//! Wi-Fi, the web UI and its socket. Telemetry flows out every tick;
//! static advance queries and changes flow in.
//!
//! # Frame format
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CRC8 │
//! │ 1B    │ 1B     │ 1B   │ 0–32B       │ 1B   │
//! └───────┴────────┴──────┴─────────────┴──────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{crc8, Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{ControlCommand, LinkMessage, Telemetry};
