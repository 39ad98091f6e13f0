//! Build script for servoarm-ctl
//!
//! Validates the embedded arm.toml at compile time so a broken default
//! configuration never ships.

use std::fs;
use std::path::Path;

/// Servo slots on the arm
const MAX_SERVOS: usize = 6;

/// Individually addressable PCA9685 channels
const CHANNEL_COUNT: i64 = 16;

/// PWM counter resolution
const PWM_PERIOD_TICKS: i64 = 4096;

fn main() {
    validate_config();
}

/// Validate arm.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=arm.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("arm.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: arm.toml not found!                                      ║\n\
            ║                                                                  ║\n\
            ║  servoarm-ctl embeds arm.toml as its default configuration.      ║\n\
            ║  Please create one in the servoarm-ctl directory.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read arm.toml                                  ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in arm.toml                          ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_top_level(&config, &mut errors);
    validate_arm(&config, &mut errors);
    validate_servos(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in arm.toml                        ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate log level and bus device
fn validate_top_level(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(level) = config.get("log_level") {
        match level.as_str() {
            Some(name) => {
                let known = ["off", "error", "warn", "info", "debug", "trace"];
                if !known.contains(&name.to_ascii_lowercase().as_str()) {
                    errors.push(format!("unknown log_level '{}'", name));
                }
            }
            None => errors.push("log_level must be a string".to_string()),
        }
    }

    if let Some(device) = config.get("bus").and_then(|b| b.get("device")) {
        if device.as_str().map_or(true, str::is_empty) {
            errors.push("[bus] device must be a non-empty path".to_string());
        }
    }
}

/// Validate the [arm] scalars
fn validate_arm(config: &toml::Value, errors: &mut Vec<String>) {
    let arm = match config.get("arm") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[arm] must be a table".to_string());
            return;
        }
        None => return,
    };

    if let Some(address) = arm.get("i2c_address") {
        match address.as_integer() {
            Some(a) if (0x03..=0x77).contains(&a) => {}
            _ => errors.push("[arm] i2c_address must be a 7-bit address".to_string()),
        }
    }

    if let Some(freq) = arm.get("frequency_hz") {
        match freq.as_integer() {
            Some(f) if (1..=u16::MAX as i64).contains(&f) => {}
            _ => errors.push("[arm] frequency_hz must be 1-65535".to_string()),
        }
    }

    if let Some(time) = arm.get("degree_time_us") {
        match time.as_integer() {
            Some(t) if (0..=u32::MAX as i64).contains(&t) => {}
            _ => errors.push("[arm] degree_time_us must be a positive integer".to_string()),
        }
    }
}

/// Validate every [[arm.servos]] entry
fn validate_servos(config: &toml::Value, errors: &mut Vec<String>) {
    let servos = match config.get("arm").and_then(|a| a.get("servos")) {
        Some(toml::Value::Array(servos)) => servos,
        Some(_) => {
            errors.push("[arm] servos must be an array of tables".to_string());
            return;
        }
        None => return,
    };

    if servos.len() > MAX_SERVOS {
        errors.push(format!("at most {} servos are supported", MAX_SERVOS));
    }

    let mut channels = Vec::new();
    for (slot, servo) in servos.iter().enumerate() {
        let servo = match servo.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("servo {} must be a table", slot));
                continue;
            }
        };

        let mut field = |name: &str| match servo.get(name).and_then(|v| v.as_integer()) {
            Some(v) => Some(v),
            None => {
                errors.push(format!("servo {} missing integer '{}'", slot, name));
                None
            }
        };
        let channel = field("channel");
        let home = field("home_deg");
        let min = field("min_deg");
        let max = field("max_deg");

        if let Some(channel) = channel {
            if !(0..CHANNEL_COUNT).contains(&channel) {
                errors.push(format!("servo {} channel must be 0-15", slot));
            } else if channels.contains(&channel) {
                errors.push(format!("servo {} reuses channel {}", slot, channel));
            }
            channels.push(channel);
        }

        if let (Some(min), Some(max)) = (min, max) {
            if min < 0 || max > 180 || min > max {
                errors.push(format!("servo {} limits must satisfy 0 <= min <= max <= 180", slot));
            } else if let Some(home) = home {
                if home < min || home > max {
                    println!(
                        "cargo:warning=arm.toml: servo {} home {} outside [{}, {}], will be clamped",
                        slot, home, min, max
                    );
                }
            }
        }

        if let Some(calibration) = servo.get("calibration") {
            let pwm_min = calibration.get("pwm_min").and_then(|v| v.as_integer());
            let pwm_max = calibration.get("pwm_max").and_then(|v| v.as_integer());
            match (pwm_min, pwm_max) {
                (Some(lo), Some(hi)) if 0 <= lo && lo <= hi && hi < PWM_PERIOD_TICKS => {}
                _ => errors.push(format!(
                    "servo {} calibration needs 0 <= pwm_min <= pwm_max < 4096",
                    slot
                )),
            }
        }
    }
}
