//! Simple TOML parser for puppet configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! puppet.toml. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [puppet] and [stage.<name>] section headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys outside section headers
//!
//! Stages are kept in file order.

use heapless::String as HString;

use super::{Choreography, ConfigError, PoseCommand, PuppetConfig, TrackingMode, MAX_LABEL_LEN};
use crate::motion::Axis;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Values parsed but do not form a valid configuration
    Invalid(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::TooManyStages => ParseError::TooManyItems,
            other => ParseError::Invalid(other),
        }
    }
}

/// Settings and stage table read from puppet.toml
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub puppet: PuppetConfig,
    pub choreography: Choreography,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Puppet,
    Stage(HString<MAX_LABEL_LEN>),
}

/// Parse TOML configuration
///
/// A file without any `[stage.*]` section uses the built-in routine.
pub fn parse_config(input: &str) -> Result<ParsedConfig, ParseError> {
    let mut puppet = PuppetConfig::default();
    let mut choreography = Choreography::new();
    let mut section = Section::Root;
    let mut current_stage: Option<PoseCommand> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_section(&mut choreography, &mut current_stage)?;

            section = parse_section_header(&line[1..line.len() - 1])?;
            if let Section::Stage(name) = &section {
                current_stage = Some(PoseCommand::new(name.as_str()));
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            match &section {
                Section::Root => {}
                Section::Puppet => apply_puppet_value(&mut puppet, key, value)?,
                Section::Stage(_) => {
                    let stage = current_stage.as_mut().ok_or(ParseError::InvalidSection)?;
                    apply_stage_value(stage, key, value)?;
                }
            }
        }
    }

    save_section(&mut choreography, &mut current_stage)?;

    if choreography.is_empty() {
        choreography = Choreography::standard();
    }

    puppet.validate()?;
    choreography.validate()?;

    Ok(ParsedConfig {
        puppet,
        choreography,
    })
}

/// Parse section header like "puppet" or "stage.frame"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    match header.split_once('.') {
        Some(("stage", name)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ParseError::InvalidSection);
            }
            let name = HString::try_from(name).map_err(|_| ParseError::InvalidSection)?;
            Ok(Section::Stage(name))
        }
        Some(_) => Err(ParseError::InvalidSection),
        None if header == "puppet" => Ok(Section::Puppet),
        None => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a float, accepting integer literals like `58`
fn parse_float(value: &str) -> Result<f32, ParseError> {
    let value: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_tracking(value: &str) -> Result<TrackingMode, ParseError> {
    match parse_string(value)? {
        "open_loop" => Ok(TrackingMode::OpenLoop),
        "closed_loop" => Ok(TrackingMode::ClosedLoop),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_puppet_value(puppet: &mut PuppetConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "steps_per_revolution" => puppet.steps_per_revolution = parse_int(value)?,
        "ticks_per_revolution" => puppet.ticks_per_revolution = parse_int(value)?,
        "run_speed" => puppet.run_speed = parse_float(value)?,
        "acceleration" => puppet.acceleration = parse_float(value)?,
        "looping" => puppet.looping = parse_bool(value)?,
        "loop_cooldown_ms" => puppet.loop_cooldown_ms = parse_int(value)?,
        "tracking" => puppet.tracking = parse_tracking(value)?,
        "invert_encoders" => puppet.invert_encoders = parse_bool(value)?,
        "max_correction_steps" => puppet.max_correction_steps = Some(parse_int(value)?),
        _ => {} // Ignore unknown keys
    }
    Ok(())
}

fn apply_stage_value(stage: &mut PoseCommand, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "label" => {
            stage.label =
                HString::try_from(parse_string(value)?).map_err(|_| ParseError::InvalidValue)?;
        }
        "left" => stage.target_deg[Axis::Left] = Some(parse_float(value)?),
        "right" => stage.target_deg[Axis::Right] = Some(parse_float(value)?),
        "delay_ms" => stage.delay_ms = parse_int(value)?,
        "left_acceleration" => stage.acceleration[Axis::Left] = Some(parse_float(value)?),
        "right_acceleration" => stage.acceleration[Axis::Right] = Some(parse_float(value)?),
        _ => {}
    }
    Ok(())
}

fn save_section(
    choreography: &mut Choreography,
    current_stage: &mut Option<PoseCommand>,
) -> Result<(), ParseError> {
    if let Some(stage) = current_stage.take() {
        choreography.push(stage)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_header() {
        match parse_section_header("stage.frame").unwrap() {
            Section::Stage(name) => assert_eq!(name.as_str(), "frame"),
            _ => panic!("Wrong section type"),
        }

        assert!(matches!(parse_section_header("puppet"), Ok(Section::Puppet)));
        assert!(parse_section_header("stage.").is_err());
        assert!(parse_section_header("stepper.left").is_err());
        assert!(parse_section_header("stage.a_name_that_is_too_long").is_err());
    }

    #[test]
    fn test_parse_key_value_strips_comments() {
        assert_eq!(parse_key_value("left = -25.0 # degrees"), Some(("left", "-25.0")));
        assert_eq!(
            parse_key_value("label = \"# one\""),
            Some(("label", "\"# one\""))
        );
        assert_eq!(parse_key_value("left ="), None);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[puppet]
steps_per_revolution = 3200
tracking = "open_loop"
max_correction_steps = 40

[stage.frame]
right = 58

[stage.fall]
label = "fall through"
delay_ms = 2000
left = -173.0
left_acceleration = 500.0
"#;

        let parsed = parse_config(config_str).unwrap();
        assert_eq!(parsed.puppet.steps_per_revolution, 3200);
        assert_eq!(parsed.puppet.ticks_per_revolution, 4000);
        assert_eq!(parsed.puppet.tracking, TrackingMode::OpenLoop);
        assert_eq!(parsed.puppet.max_correction_steps, Some(40));

        let stages = &parsed.choreography;
        assert_eq!(stages.len(), 2);

        let frame = stages.get(0).unwrap();
        assert_eq!(frame.label.as_str(), "frame");
        assert_eq!(frame.target(Axis::Right), Some(58.0));
        assert_eq!(frame.target(Axis::Left), None);
        assert_eq!(frame.delay_ms, 0);

        let fall = stages.get(1).unwrap();
        assert_eq!(fall.label.as_str(), "fall through");
        assert_eq!(fall.delay_ms, 2000);
        assert_eq!(fall.acceleration[Axis::Left], Some(500.0));
    }

    #[test]
    fn test_no_stages_uses_builtin_routine() {
        let parsed = parse_config("[puppet]\nlooping = true\n").unwrap();
        assert!(parsed.puppet.looping);
        assert_eq!(parsed.choreography, Choreography::standard());
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[puppet]\nlooping = yes\n").unwrap_err(),
            ParseError::InvalidValue
        );
        assert_eq!(
            parse_config("[puppet]\ntracking = \"sometimes\"\n").unwrap_err(),
            ParseError::InvalidValue
        );
        assert_eq!(
            parse_config("[puppet]\nsteps_per_revolution = 0\n").unwrap_err(),
            ParseError::Invalid(ConfigError::InvalidRatio)
        );
        assert_eq!(
            parse_config("[stepper.left]\n").unwrap_err(),
            ParseError::InvalidSection
        );
    }

    #[test]
    fn test_embedded_config_matches_builtin_routine() {
        let parsed = parse_config(include_str!("../../../marionette-firmware/puppet.toml")).unwrap();
        assert_eq!(parsed.puppet, PuppetConfig::default());
        assert_eq!(parsed.choreography, Choreography::standard());
    }
}
