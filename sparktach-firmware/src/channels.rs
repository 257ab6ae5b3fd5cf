//! Inter-task communication channels
//!
//! Static embassy-sync primitives shared between the firmware tasks. The
//! edge tasks do not appear here: they write straight into the shared
//! timing engine.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use sparktach_core::config::StaticAdvance;
use sparktach_core::telemetry::TelemetrySample;
use sparktach_protocol::LinkMessage;

/// Telemetry samples queued for the link
pub const TELEMETRY_CHANNEL_SIZE: usize = 4;

/// Replies to bridge commands queued for the link
const REPLY_CHANNEL_SIZE: usize = 4;

/// Samples from the publisher to the link TX task
pub static TELEMETRY_CHANNEL: Channel<
    CriticalSectionRawMutex,
    TelemetrySample,
    TELEMETRY_CHANNEL_SIZE,
> = Channel::new();

/// Command replies from the link RX task to the link TX task
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, LinkMessage, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Accepted static advance waiting to be written to flash
///
/// Only the latest value matters, so a burst of changes results in one write.
pub static SETTINGS_SAVE: Signal<CriticalSectionRawMutex, StaticAdvance> = Signal::new();
