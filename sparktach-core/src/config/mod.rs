//! Configuration types
//!
//! Engine configuration parsed from `engine.toml`, plus the settings
//! record persisted to flash.

pub mod parse;
pub mod settings;
pub mod types;

pub use parse::{parse_config, parse_pin, ParseError, ParseErrorKind, PinRef};
pub use settings::{PersistedSettings, SettingsError, MAX_SETTINGS_SIZE, SETTINGS_MAGIC, SETTINGS_VERSION};
pub use types::*;
