//! Configuration type definitions
//!
//! Engine and input configuration, plus the validated static advance
//! setting that the control channel may change at runtime.

use serde::{Deserialize, Serialize};

use crate::timing::filter::MIN_INTERVAL_US;

/// Lowest accepted static advance in degrees
pub const STATIC_ADVANCE_MIN: u16 = 1;

/// Highest accepted static advance in degrees
pub const STATIC_ADVANCE_MAX: u16 = 359;

/// Static advance used when neither config nor flash supply one
pub const DEFAULT_STATIC_ADVANCE: u16 = 36;

/// Default stall timeout: no pickup edge for 1.5 s means the engine stopped
pub const DEFAULT_STALL_TIMEOUT_MS: u32 = 1_500;

/// Default telemetry cadence
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u32 = 20;

/// Default link UART baud rate
pub const DEFAULT_LINK_BAUD: u32 = 115_200;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Static advance outside 1..=359 degrees
    StaticAdvanceOutOfRange(i32),
    /// Zero or otherwise unusable interval
    InvalidInterval,
    /// GPIO number out of range
    InvalidPin,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::StaticAdvanceOutOfRange(value) => {
                write!(f, "static advance {} outside 1..=359", value)
            }
            ConfigError::InvalidInterval => f.write_str("invalid interval"),
            ConfigError::InvalidPin => f.write_str("invalid pin"),
        }
    }
}

/// Baseline ignition angle in degrees, guaranteed to lie in (0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(try_from = "u16", into = "u16")]
pub struct StaticAdvance(u16);

impl StaticAdvance {
    /// Built-in default
    pub const DEFAULT: Self = Self(DEFAULT_STATIC_ADVANCE);

    /// Validate and wrap a raw degree value
    pub const fn new(degrees: i32) -> Result<Self, ConfigError> {
        if degrees < STATIC_ADVANCE_MIN as i32 || degrees > STATIC_ADVANCE_MAX as i32 {
            return Err(ConfigError::StaticAdvanceOutOfRange(degrees));
        }
        Ok(Self(degrees as u16))
    }

    /// Degrees as stored
    pub const fn degrees(self) -> u16 {
        self.0
    }
}

impl Default for StaticAdvance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u16> for StaticAdvance {
    type Error = ConfigError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Self::new(degrees as i32)
    }
}

impl From<StaticAdvance> for u16 {
    fn from(advance: StaticAdvance) -> Self {
        advance.0
    }
}

/// Signal transition that triggers an edge handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolarity {
    Rising,
    #[default]
    Falling,
    Both,
}

impl EdgePolarity {
    /// Parse the config spelling ("rising", "falling", "both")
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rising" => Some(Self::Rising),
            "falling" => Some(Self::Falling),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// One sensor input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeInputConfig {
    /// GPIO number
    pub pin: u8,
    /// Enable the internal pull-up
    pub pull_up: bool,
    /// Trigger transition
    pub polarity: EdgePolarity,
    /// Bounce rejection window (µs)
    pub min_interval_us: u32,
}

impl EdgeInputConfig {
    /// Input with default filter window and falling-edge trigger
    pub const fn on_pin(pin: u8) -> Self {
        Self {
            pin,
            pull_up: false,
            polarity: EdgePolarity::Falling,
            min_interval_us: MIN_INTERVAL_US,
        }
    }
}

/// Telemetry publishing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryConfig {
    /// Sampling cadence
    pub interval_ms: u32,
    /// Link UART baud rate
    pub baud: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
            baud: DEFAULT_LINK_BAUD,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Pickup (one edge per revolution) input
    pub pickup: EdgeInputConfig,
    /// Spark sensor input
    pub spark: EdgeInputConfig,
    /// Static advance applied until the control channel changes it
    pub static_advance: StaticAdvance,
    /// No pickup edge for this long reports speed/advance as unknown
    pub stall_timeout_ms: u32,
    /// Telemetry settings
    pub telemetry: TelemetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pickup: EdgeInputConfig::on_pin(13),
            spark: EdgeInputConfig::on_pin(4),
            static_advance: StaticAdvance::default(),
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pickup.min_interval_us == 0 || self.spark.min_interval_us == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.telemetry.interval_ms == 0 || self.stall_timeout_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.pickup.pin == self.spark.pin {
            return Err(ConfigError::InvalidPin);
        }
        Ok(())
    }

    /// Stall timeout in µs
    pub fn stall_timeout_us(&self) -> u32 {
        self.stall_timeout_ms.saturating_mul(1_000)
    }

    /// Telemetry cadence in µs
    pub fn telemetry_interval_us(&self) -> u32 {
        self.telemetry.interval_ms.saturating_mul(1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_advance_bounds() {
        assert_eq!(StaticAdvance::new(0), Err(ConfigError::StaticAdvanceOutOfRange(0)));
        assert_eq!(StaticAdvance::new(360), Err(ConfigError::StaticAdvanceOutOfRange(360)));
        assert_eq!(StaticAdvance::new(-5), Err(ConfigError::StaticAdvanceOutOfRange(-5)));
        assert_eq!(StaticAdvance::new(1).map(StaticAdvance::degrees), Ok(1));
        assert_eq!(StaticAdvance::new(180).map(StaticAdvance::degrees), Ok(180));
        assert_eq!(StaticAdvance::new(359).map(StaticAdvance::degrees), Ok(359));
    }

    #[test]
    fn test_polarity_names() {
        assert_eq!(EdgePolarity::from_name("rising"), Some(EdgePolarity::Rising));
        assert_eq!(EdgePolarity::from_name("falling"), Some(EdgePolarity::Falling));
        assert_eq!(EdgePolarity::from_name("both"), Some(EdgePolarity::Both));
        assert_eq!(EdgePolarity::from_name("up"), None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.static_advance.degrees(), 36);
        assert_eq!(config.telemetry_interval_us(), 20_000);
    }

    #[test]
    fn test_shared_pin_rejected() {
        let mut config = EngineConfig::default();
        config.spark.pin = config.pickup.pin;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPin));
    }
}
