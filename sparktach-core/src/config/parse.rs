//! Minimal TOML reader for `engine.toml`
//!
//! Handles only the subset the engine configuration uses. It does NOT
//! support the full TOML grammar.
//!
//! Supported:
//! - `[section]` headers
//! - `key = value` pairs (quoted or bare strings, integers)
//! - Comments (`# ...`), also trailing a value
//!
//! Unknown sections and keys are skipped so newer config files still load
//! on older firmware.

use super::types::{EdgeInputConfig, EdgePolarity, EngineConfig, StaticAdvance};

/// What went wrong on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Unterminated or empty section header
    InvalidSection,
    /// Line is neither a header, a comment nor `key = value`
    InvalidLine,
    /// Value does not parse as the expected type
    InvalidValue,
    /// Pin string is not `gpioNN` (with optional `^` prefix)
    InvalidPin,
    /// Edge is not `rising`, `falling` or `both`
    InvalidEdge,
    /// Static advance outside 1..=359
    OutOfRange,
    /// Cross-field check failed after parsing
    Inconsistent,
}

/// Parse error with the 1-based line it occurred on (0 = whole file)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    const fn at(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}: {:?}", self.line, self.kind)
    }
}

/// Parsed pin reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinRef {
    pub pin: u8,
    pub pull_up: bool,
}

/// Highest GPIO number on the supported boards
const MAX_GPIO: u8 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Pickup,
    Spark,
    Timing,
    Telemetry,
    Unknown,
}

/// Parse `engine.toml` text into an [`EngineConfig`]
///
/// Keys that are absent keep their built-in defaults.
pub fn parse_config(input: &str) -> Result<EngineConfig, ParseError> {
    let mut config = EngineConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)
                .ok_or(ParseError::at(line_no, ParseErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) =
            parse_key_value(line).ok_or(ParseError::at(line_no, ParseErrorKind::InvalidLine))?;

        apply_value(section, key, value, &mut config).map_err(|kind| ParseError::at(line_no, kind))?;
    }

    config
        .validate()
        .map_err(|_| ParseError::at(0, ParseErrorKind::Inconsistent))?;

    Ok(config)
}

fn parse_section_header(line: &str) -> Option<Section> {
    let name = line.strip_prefix('[')?;
    let name = strip_comment(name).strip_suffix(']')?.trim();

    let section = match name {
        "" => return None,
        "pickup" => Section::Pickup,
        "spark" => Section::Spark,
        "timing" => Section::Timing,
        "telemetry" => Section::Telemetry,
        _ => Section::Unknown,
    };
    Some(section)
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut EngineConfig,
) -> Result<(), ParseErrorKind> {
    match section {
        Section::Pickup => apply_input(&mut config.pickup, key, value),
        Section::Spark => apply_input(&mut config.spark, key, value),
        Section::Timing => {
            match key {
                "default_static_advance" => {
                    let degrees: i32 = parse_int(value)?;
                    config.static_advance =
                        StaticAdvance::new(degrees).map_err(|_| ParseErrorKind::OutOfRange)?;
                }
                "stall_timeout_ms" => config.stall_timeout_ms = parse_int(value)?,
                _ => {}
            }
            Ok(())
        }
        Section::Telemetry => {
            match key {
                "interval_ms" => config.telemetry.interval_ms = parse_int(value)?,
                "baud" => config.telemetry.baud = parse_int(value)?,
                _ => {}
            }
            Ok(())
        }
        Section::Root | Section::Unknown => Ok(()),
    }
}

fn apply_input(input: &mut EdgeInputConfig, key: &str, value: &str) -> Result<(), ParseErrorKind> {
    match key {
        "pin" => {
            let pin = parse_pin(value)?;
            input.pin = pin.pin;
            input.pull_up = pin.pull_up;
        }
        "edge" => {
            input.polarity =
                EdgePolarity::from_name(parse_string(value)).ok_or(ParseErrorKind::InvalidEdge)?;
        }
        "min_interval_us" => input.min_interval_us = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

/// Strip a trailing comment that is not inside a quoted string
fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(hash) if value[..hash].matches('"').count() % 2 == 0 => value[..hash].trim_end(),
        _ => value,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value.trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    let digits = parse_string(value);
    // TOML allows `_` separators; only strip them when present
    if digits.contains('_') {
        let mut buf: heapless::String<16> = heapless::String::new();
        for c in digits.chars().filter(|c| *c != '_') {
            buf.push(c).map_err(|_| ParseErrorKind::InvalidValue)?;
        }
        return buf.parse().map_err(|_| ParseErrorKind::InvalidValue);
    }
    digits.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

/// Parse a pin string like `"gpio13"` or `"^gpio4"` (pull-up)
pub fn parse_pin(value: &str) -> Result<PinRef, ParseErrorKind> {
    let mut s = parse_string(value);
    let mut pull_up = false;

    if let Some(rest) = s.strip_prefix('^') {
        pull_up = true;
        s = rest;
    }

    let number = s.strip_prefix("gpio").ok_or(ParseErrorKind::InvalidPin)?;
    let pin: u8 = number.parse().map_err(|_| ParseErrorKind::InvalidPin)?;
    if pin > MAX_GPIO {
        return Err(ParseErrorKind::InvalidPin);
    }

    Ok(PinRef { pin, pull_up })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio13").unwrap();
        assert_eq!(pin.pin, 13);
        assert!(!pin.pull_up);

        let pin = parse_pin("\"^gpio4\"").unwrap();
        assert_eq!(pin.pin, 4);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("pin4"), Err(ParseErrorKind::InvalidPin));
        assert_eq!(parse_pin("gpio30"), Err(ParseErrorKind::InvalidPin));
        assert_eq!(parse_pin("gpio"), Err(ParseErrorKind::InvalidPin));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config(""), Ok(EngineConfig::default()));
    }

    #[test]
    fn test_parse_full_config() {
        let text = r#"
# Single-cylinder test engine
[pickup]
pin = "^gpio13"
edge = "rising"
min_interval_us = 800

[spark]
pin = "gpio4"   # inductive clamp
edge = "both"

[timing]
default_static_advance = 10
stall_timeout_ms = 2_000

[telemetry]
interval_ms = 50
baud = 230400
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.pickup.pin, 13);
        assert!(config.pickup.pull_up);
        assert_eq!(config.pickup.polarity, EdgePolarity::Rising);
        assert_eq!(config.pickup.min_interval_us, 800);
        assert_eq!(config.spark.pin, 4);
        assert_eq!(config.spark.polarity, EdgePolarity::Both);
        assert_eq!(config.spark.min_interval_us, 500);
        assert_eq!(config.static_advance.degrees(), 10);
        assert_eq!(config.stall_timeout_ms, 2_000);
        assert_eq!(config.telemetry.interval_ms, 50);
        assert_eq!(config.telemetry.baud, 230_400);
    }

    #[test]
    fn test_unknown_keys_and_sections_skipped() {
        let text = "[display]\nbrightness = 3\n[timing]\ncolour = \"red\"\n";
        assert_eq!(parse_config(text), Ok(EngineConfig::default()));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let text = "[timing]\n\ndefault_static_advance = 360\n";
        assert_eq!(
            parse_config(text),
            Err(ParseError::at(3, ParseErrorKind::OutOfRange))
        );

        let text = "[spark\n";
        assert_eq!(
            parse_config(text),
            Err(ParseError::at(1, ParseErrorKind::InvalidSection))
        );

        let text = "[spark]\nedge = \"sideways\"\n";
        assert_eq!(
            parse_config(text),
            Err(ParseError::at(2, ParseErrorKind::InvalidEdge))
        );

        let text = "[pickup]\njust some words\n";
        assert_eq!(
            parse_config(text),
            Err(ParseError::at(2, ParseErrorKind::InvalidLine))
        );
    }

    #[test]
    fn test_shared_pin_is_inconsistent() {
        let text = "[pickup]\npin = \"gpio4\"\n";
        assert_eq!(
            parse_config(text),
            Err(ParseError::at(0, ParseErrorKind::Inconsistent))
        );
    }
}
