//! Build script for sparktach-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates engine.toml at compile time

use std::env;
use std::fs;
use std::path::PathBuf;

/// UART0 TX/RX for the bridge link
const RESERVED_PINS: [i64; 2] = [0, 1];

fn main() {
    setup_linker();
    validate_config();
}

/// Put memory.x on the linker search path
fn setup_linker() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x")).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate engine.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=engine.toml");

    let text = fs::read_to_string("engine.toml").unwrap_or_else(|e| {
        fail(
            "cannot read engine.toml",
            &[
                e.to_string(),
                "the firmware embeds it as its pin and timing config".to_string(),
            ],
        )
    });

    let config: toml::Value = toml::from_str(&text).unwrap_or_else(|e| {
        let lines: Vec<String> = e.to_string().lines().map(str::to_owned).collect();
        fail("engine.toml is not valid TOML", &lines)
    });

    let errors = collect_errors(&config);
    if !errors.is_empty() {
        fail("engine.toml failed validation", &errors);
    }

    println!("cargo:warning=engine.toml validated successfully");
}

/// Stop the build with one report listing every problem
fn fail(title: &str, details: &[String]) -> ! {
    let mut report = format!("\n\nsparktach-firmware: {}\n", title);
    for line in details {
        report.push_str("    ");
        report.push_str(line);
        report.push('\n');
    }
    panic!("{}", report);
}

fn collect_errors(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    validate_required_sections(config, &mut errors);
    let pickup_pin = validate_input(config, "pickup", &mut errors);
    let spark_pin = validate_input(config, "spark", &mut errors);
    validate_timing(config, &mut errors);
    validate_telemetry(config, &mut errors);

    if let (Some(pickup), Some(spark)) = (pickup_pin, spark_pin) {
        if pickup == spark {
            errors.push(format!("[pickup] and [spark] both use gpio{}", pickup));
        }
    }
    errors
}

fn validate_required_sections(config: &toml::Value, errors: &mut Vec<String>) {
    for section in ["pickup", "spark"] {
        match config.get(section) {
            Some(toml::Value::Table(_)) => {}
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }
}

/// Check one sensor input section, returning its GPIO number if valid
fn validate_input(config: &toml::Value, section: &str, errors: &mut Vec<String>) -> Option<i64> {
    let table = config.get(section)?.as_table()?;

    let pin = match table.get("pin") {
        Some(toml::Value::String(pin)) => match parse_pin(pin) {
            Some(num) if RESERVED_PINS.contains(&num) => {
                errors.push(format!("[{}] gpio{} is reserved for the link UART", section, num));
                None
            }
            Some(num) => Some(num),
            None => {
                errors.push(format!("[{}] pin must look like \"gpio13\" or \"^gpio13\"", section));
                None
            }
        },
        Some(_) => {
            errors.push(format!("[{}] pin must be a string", section));
            None
        }
        None => {
            errors.push(format!("[{}] missing 'pin'", section));
            None
        }
    };

    if let Some(edge) = table.get("edge") {
        match edge.as_str() {
            Some("rising" | "falling" | "both") => {}
            _ => errors.push(format!(
                "[{}] edge must be 'rising', 'falling', or 'both'",
                section
            )),
        }
    }

    if let Some(interval) = table.get("min_interval_us") {
        match interval.as_integer() {
            Some(us) if us > 0 && us <= u32::MAX as i64 => {}
            _ => errors.push(format!("[{}] min_interval_us must be positive", section)),
        }
    }

    pin
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(timing) = config.get("timing").and_then(|t| t.as_table()) else {
        return;
    };

    if let Some(advance) = timing.get("default_static_advance") {
        match advance.as_integer() {
            Some(deg) if (1..=359).contains(&deg) => {}
            _ => errors.push("[timing] default_static_advance must be 1-359".to_string()),
        }
    }

    if let Some(timeout) = timing.get("stall_timeout_ms") {
        match timeout.as_integer() {
            Some(ms) if ms > 0 && ms <= 60_000 => {}
            _ => errors.push("[timing] stall_timeout_ms must be 1-60000".to_string()),
        }
    }
}

fn validate_telemetry(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(telemetry) = config.get("telemetry").and_then(|t| t.as_table()) else {
        return;
    };

    if let Some(interval) = telemetry.get("interval_ms") {
        match interval.as_integer() {
            Some(ms) if ms > 0 && ms <= 60_000 => {}
            _ => errors.push("[telemetry] interval_ms must be 1-60000".to_string()),
        }
    }

    if let Some(baud) = telemetry.get("baud") {
        match baud.as_integer() {
            Some(b) if b > 0 && b <= u32::MAX as i64 => {}
            _ => errors.push("[telemetry] baud must be positive".to_string()),
        }
    }
}

/// "gpio13" or "^gpio13" to 13
fn parse_pin(pin: &str) -> Option<i64> {
    let pin = pin.strip_prefix('^').unwrap_or(pin);
    let num: i64 = pin.strip_prefix("gpio")?.parse().ok()?;
    (0..=29).contains(&num).then_some(num)
}
