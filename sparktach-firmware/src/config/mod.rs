//! Configuration loading
//!
//! `engine.toml` is compiled into the firmware; the persisted static
//! advance in flash takes precedence over its `default_static_advance`.

pub mod settings;

use defmt::*;

use sparktach_core::config::{parse_config, EngineConfig};

/// Embedded engine configuration (compiled into firmware)
/// Edit engine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../engine.toml");

/// Parse the embedded configuration, falling back to built-in defaults
pub fn load_engine_config() -> EngineConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration");
            config
        }
        Err(e) => {
            warn!(
                "engine.toml rejected at line {}: {:?}, using defaults",
                e.line, e.kind
            );
            EngineConfig::default()
        }
    }
}
