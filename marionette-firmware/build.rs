//! Build script for marionette-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates puppet.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `MAX_STAGES` in marionette-core
const MAX_STAGES: usize = 32;

/// Must match `MAX_LABEL_LEN` in marionette-core
const MAX_LABEL_LEN: usize = 16;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate puppet.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=puppet.toml");

    let config_path = Path::new("puppet.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: puppet.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds puppet.toml from the marionette-firmware    ║\n\
            ║  directory. Please create one there.                             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read puppet.toml                               ║\n\
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
                ║  ERROR: Invalid TOML syntax in puppet.toml                       ║\n\
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
    validate_puppet(&config, &mut errors);
    validate_stages(&config, &mut errors);
    report("Invalid puppet configuration", &errors);

    println!("cargo:warning=puppet.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build if any errors were collected
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Accept integers and floats for numeric fields
fn as_number(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Validate the [puppet] section
fn validate_puppet(config: &toml::Value, errors: &mut Vec<String>) {
    let puppet = match config.get("puppet") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[puppet] must be a table".to_string());
            return;
        }
        None => {
            errors.push("Missing [puppet] section".to_string());
            return;
        }
    };

    for key in ["steps_per_revolution", "ticks_per_revolution"] {
        match puppet.get(key) {
            Some(toml::Value::Integer(n)) if *n > 0 && *n <= u32::MAX as i64 => {}
            Some(_) => errors.push(format!("[puppet] {} must be a positive integer", key)),
            None => {}
        }
    }

    for key in ["run_speed", "acceleration"] {
        if let Some(value) = puppet.get(key) {
            match as_number(value) {
                Some(n) if n > 0.0 => {}
                _ => errors.push(format!("[puppet] {} must be a positive number", key)),
            }
        }
    }

    for key in ["looping", "invert_encoders"] {
        if let Some(value) = puppet.get(key) {
            if !value.is_bool() {
                errors.push(format!("[puppet] {} must be true or false", key));
            }
        }
    }

    for key in ["loop_cooldown_ms", "max_correction_steps"] {
        match puppet.get(key) {
            Some(toml::Value::Integer(n)) if *n >= 0 && *n <= u32::MAX as i64 => {}
            Some(_) => errors.push(format!("[puppet] {} must be a non-negative integer", key)),
            None => {}
        }
    }

    if let Some(value) = puppet.get("tracking") {
        match value.as_str() {
            Some("open_loop") | Some("closed_loop") => {}
            _ => errors.push("[puppet] tracking must be 'open_loop' or 'closed_loop'".to_string()),
        }
    }
}

/// Validate the [stage.*] sections
fn validate_stages(config: &toml::Value, errors: &mut Vec<String>) {
    let stages = match config.get("stage") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[stage] must contain [stage.<name>] tables".to_string());
            return;
        }
        // Built-in routine is used
        None => return,
    };

    if stages.is_empty() {
        errors.push("At least one [stage.<name>] section is required".to_string());
    }
    if stages.len() > MAX_STAGES {
        errors.push(format!("At most {} stages are supported", MAX_STAGES));
    }

    for (name, stage) in stages {
        let stage = match stage {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[stage.{}] must be a table", name));
                continue;
            }
        };

        if name.len() > MAX_LABEL_LEN {
            errors.push(format!("[stage.{}] name longer than {}", name, MAX_LABEL_LEN));
        }

        if let Some(label) = stage.get("label") {
            match label.as_str() {
                Some(l) if l.len() <= MAX_LABEL_LEN => {}
                _ => errors.push(format!(
                    "[stage.{}] label must be a string of at most {} bytes",
                    name, MAX_LABEL_LEN
                )),
            }
        }

        for key in ["left", "right"] {
            if let Some(value) = stage.get(key) {
                if as_number(value).is_none() {
                    errors.push(format!("[stage.{}] {} must be an angle in degrees", name, key));
                }
            }
        }

        for key in ["left_acceleration", "right_acceleration"] {
            if let Some(value) = stage.get(key) {
                match as_number(value) {
                    Some(n) if n > 0.0 => {}
                    _ => errors.push(format!("[stage.{}] {} must be positive", name, key)),
                }
            }
        }

        match stage.get("delay_ms") {
            Some(toml::Value::Integer(n)) if *n >= 0 && *n <= u32::MAX as i64 => {}
            Some(_) => errors.push(format!("[stage.{}] delay_ms must be a non-negative integer", name)),
            None => {}
        }
    }
}
