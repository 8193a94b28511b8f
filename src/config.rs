//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files, and
//! compiling the configured channel expressions into a runtime
//! [`ChannelSet`].

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::mix::channel_set::ChannelSet;
use crate::mix::expr::Expr;
use crate::mix::snapshot::HatAxis;
use crate::mix::source::InputSource;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub device: DeviceConfig,
    pub cycle: CycleConfig,
    pub ppm: PpmConfig,
    pub channels: Vec<ChannelSpec>,
}

/// Joystick selection
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Index into the sorted list of joystick-like event devices
    #[serde(default = "default_device_index")]
    pub index: usize,
}

/// Evaluation cycle configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CycleConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

/// PPM output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PpmConfig {
    /// BCM pin number the pulse train is emitted on
    #[serde(default = "default_ppm_pin")]
    pub pin: u8,

    /// Channel width at full negative deflection, microseconds
    #[serde(default = "default_channel_min_us")]
    pub channel_min_us: u16,

    /// Channel width at full positive deflection, microseconds
    #[serde(default = "default_channel_max_us")]
    pub channel_max_us: u16,

    /// Fixed marker pulse at the start of every channel, microseconds
    #[serde(default = "default_pulse_us")]
    pub pulse_us: u16,

    /// Total frame length, microseconds
    #[serde(default = "default_frame_us")]
    pub frame_us: u32,

    /// Invert pulse polarity (idle high, pulse low)
    #[serde(default)]
    pub invert: bool,
}

/// One output channel: an optional name and an expression tree
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSpec {
    /// Display name used in logs; channels without one get "ch<N>"
    #[serde(default)]
    pub name: Option<String>,

    pub expr: ExprSpec,
}

/// A channel expression, as written in TOML.
///
/// Each node is a table with exactly one key naming the node kind:
///
/// ```toml
/// expr = { axis = 0 }
/// expr = { negate = { axis = 1 } }
/// expr = { add = { left = { axis = 0 }, right = 0.1 } }
/// expr = { hat_switch = { hat = 0, axis = "y", positions = 5 } }
/// ```
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ExprSpec {
    /// Normalized axis position
    Axis(usize),
    /// Button as full-scale deflection (pressed = 1, released = -1)
    Button(usize),
    /// Multi-position switch stepped by one hat axis
    HatSwitch(HatSwitchSpec),
    /// Negation of a subtree
    Negate(Box<ExprSpec>),
    /// Normalize-to-unit of a subtree ([-1, 1] onto [0, 1])
    Unit(Box<ExprSpec>),
    /// Sum of a subtree and an operand
    Add(BinarySpec),
    /// Difference of a subtree and an operand
    Sub(BinarySpec),
    /// Product of a subtree and an operand
    Mul(BinarySpec),
}

/// Hat-switch node parameters
#[derive(Debug, Deserialize, Clone)]
pub struct HatSwitchSpec {
    /// Hat id on the device
    #[serde(default)]
    pub hat: usize,

    /// Which hat axis drives the switch
    pub axis: HatAxisName,

    /// Number of switch positions, at least 2
    pub positions: usize,

    /// Starting position
    #[serde(default)]
    pub initial: usize,
}

/// Hat axis name as written in TOML
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HatAxisName {
    X,
    Y,
}

impl From<HatAxisName> for HatAxis {
    fn from(name: HatAxisName) -> Self {
        match name {
            HatAxisName::X => HatAxis::X,
            HatAxisName::Y => HatAxis::Y,
        }
    }
}

/// Binary node: a left subtree and a constant-or-subtree right side
#[derive(Debug, Deserialize, Clone)]
pub struct BinarySpec {
    pub left: Box<ExprSpec>,
    pub right: OperandSpec,
}

/// Right side of a binary node
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum OperandSpec {
    /// A fixed value
    Value(f32),
    /// A nested expression
    Node(Box<ExprSpec>),
}

// Default value functions
fn default_device_index() -> usize { 0 }
fn default_rate_hz() -> u32 { 50 }
fn default_ppm_pin() -> u8 { 24 }
fn default_channel_min_us() -> u16 { 1000 }
fn default_channel_max_us() -> u16 { 2000 }
fn default_pulse_us() -> u16 { 300 }
fn default_frame_us() -> u32 { 20000 }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stickmix::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Compile the configured channels into a runtime channel set.
    ///
    /// Channel order in the set matches declaration order in the file.
    /// Returns the channel names alongside; unnamed channels are called
    /// `ch<N>` with N counted from 1.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::InvalidConfiguration`](crate::error::StickmixError::InvalidConfiguration)
    /// if a hat-switch node has an invalid position count or starting
    /// position.
    pub fn build_channels(&self) -> Result<(ChannelSet, Vec<String>)> {
        let source = InputSource::new(self.device.index);
        let mut exprs = Vec::with_capacity(self.channels.len());
        let mut names = Vec::with_capacity(self.channels.len());

        for (index, spec) in self.channels.iter().enumerate() {
            exprs.push(spec.expr.build(&source)?);
            names.push(
                spec.name
                    .clone()
                    .unwrap_or_else(|| format!("ch{}", index + 1)),
            );
        }

        Ok((ChannelSet::new(exprs), names))
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.cycle.rate_hz < 10 || self.cycle.rate_hz > 500 {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("rate_hz must be between 10 and 500")
            ));
        }

        if self.ppm.channel_min_us < 800 || self.ppm.channel_min_us > 1500 {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("channel_min_us must be between 800 and 1500")
            ));
        }

        if self.ppm.channel_max_us < 1500 || self.ppm.channel_max_us > 2200 {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("channel_max_us must be between 1500 and 2200")
            ));
        }

        if self.ppm.channel_min_us >= self.ppm.channel_max_us {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("channel_min_us must be less than channel_max_us")
            ));
        }

        if self.ppm.pulse_us < 100 || self.ppm.pulse_us > 500 {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("pulse_us must be between 100 and 500")
            ));
        }

        if self.ppm.pulse_us >= self.ppm.channel_min_us {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("pulse_us must be less than channel_min_us")
            ));
        }

        if self.channels.is_empty() {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom("at least one [[channels]] entry is required")
            ));
        }

        // PPM decoders find the frame start by the long sync gap, so the
        // frame must fit every channel at max width and still leave a gap
        // of at least two channel widths.
        let channel_time = self.channels.len() as u32 * u32::from(self.ppm.channel_max_us);
        let min_frame = channel_time + 2 * u32::from(self.ppm.channel_max_us);
        if self.ppm.frame_us < min_frame {
            return Err(crate::error::StickmixError::Config(
                toml::de::Error::custom(format!(
                    "frame_us too short for {} channels (need at least {})",
                    self.channels.len(),
                    min_frame
                ))
            ));
        }

        Ok(())
    }
}

impl ExprSpec {
    /// Build this spec into a runtime expression bound to `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::InvalidConfiguration`](crate::error::StickmixError::InvalidConfiguration)
    /// on an invalid hat-switch definition.
    pub fn build(&self, source: &InputSource) -> Result<Expr> {
        Ok(match self {
            ExprSpec::Axis(index) => source.axis(*index),
            ExprSpec::Button(index) => source.button(*index),
            ExprSpec::HatSwitch(spec) => {
                source.hat_switch(spec.hat, spec.axis.into(), spec.positions, spec.initial)?
            }
            ExprSpec::Negate(inner) => -inner.build(source)?,
            ExprSpec::Unit(inner) => inner.build(source)?.unit_range(),
            ExprSpec::Add(spec) => match &spec.right {
                OperandSpec::Value(value) => spec.left.build(source)? + *value,
                OperandSpec::Node(node) => spec.left.build(source)? + node.build(source)?,
            },
            ExprSpec::Sub(spec) => match &spec.right {
                OperandSpec::Value(value) => spec.left.build(source)? - *value,
                OperandSpec::Node(node) => spec.left.build(source)? - node.build(source)?,
            },
            ExprSpec::Mul(spec) => match &spec.right {
                OperandSpec::Value(value) => spec.left.build(source)? * *value,
                OperandSpec::Node(node) => spec.left.build(source)? * node.build(source)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_channel(index: usize) -> ChannelSpec {
        ChannelSpec {
            name: None,
            expr: ExprSpec::Axis(index),
        }
    }

    fn create_valid_config() -> Config {
        Config {
            device: DeviceConfig {
                index: default_device_index(),
            },
            cycle: CycleConfig {
                rate_hz: default_rate_hz(),
            },
            ppm: PpmConfig {
                pin: default_ppm_pin(),
                channel_min_us: default_channel_min_us(),
                channel_max_us: default_channel_max_us(),
                pulse_us: default_pulse_us(),
                frame_us: default_frame_us(),
                invert: false,
            },
            channels: vec![axis_channel(0), axis_channel(1)],
        }
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_too_low() {
        let mut config = create_valid_config();
        config.cycle.rate_hz = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_too_high() {
        let mut config = create_valid_config();
        config.cycle.rate_hz = 501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_min_too_low() {
        let mut config = create_valid_config();
        config.ppm.channel_min_us = 799;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_max_too_high() {
        let mut config = create_valid_config();
        config.ppm.channel_max_us = 2201;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_min_equals_max() {
        let mut config = create_valid_config();
        config.ppm.channel_min_us = 1500;
        config.ppm.channel_max_us = 1500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pulse_too_short() {
        let mut config = create_valid_config();
        config.ppm.pulse_us = 99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pulse_too_long() {
        let mut config = create_valid_config();
        config.ppm.pulse_us = 501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_channels_rejected() {
        let mut config = create_valid_config();
        config.channels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_too_short_for_channels() {
        let mut config = create_valid_config();
        config.channels = (0..9).map(axis_channel).collect();
        // 9 channels at 2000us need 22000us with the sync gap
        assert!(config.validate().is_err());

        config.ppm.frame_us = 22000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_device_index(), 0);
        assert_eq!(default_rate_hz(), 50);
        assert_eq!(default_ppm_pin(), 24);
        assert_eq!(default_channel_min_us(), 1000);
        assert_eq!(default_channel_max_us(), 2000);
        assert_eq!(default_pulse_us(), 300);
        assert_eq!(default_frame_us(), 20000);
    }

    // ==================== File Loading Tests ====================

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[device]
index = 0

[cycle]
rate_hz = 50

[ppm]
pin = 24

[[channels]]
name = "aileron"
expr = { add = { left = { axis = 0 }, right = { mul = { left = { hat_switch = { hat = 0, axis = "x", positions = 41, initial = 20 } }, right = 0.5 } } } }

[[channels]]
name = "elevator"
expr = { negate = { axis = 1 } }

[[channels]]
expr = { button = 0 }
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.channels[0].name.as_deref(), Some("aileron"));

        let (channels, names) = config.build_channels().unwrap();
        assert_eq!(channels.len(), 3);
        assert_eq!(names, vec!["aileron", "elevator", "ch3"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/stickmix.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_unknown_expr_kind() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[device]
[cycle]
[ppm]

[[channels]]
expr = { wobble = 3 }
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    // ==================== Expression Building Tests ====================

    #[test]
    fn test_build_leaf_specs() {
        let source = InputSource::new(0);
        assert_eq!(
            ExprSpec::Axis(2).build(&source).unwrap(),
            source.axis(2)
        );
        assert_eq!(
            ExprSpec::Button(1).build(&source).unwrap(),
            source.button(1)
        );
    }

    #[test]
    fn test_build_arithmetic_tree() {
        let source = InputSource::new(0);
        let spec = ExprSpec::Add(BinarySpec {
            left: Box::new(ExprSpec::Mul(BinarySpec {
                left: Box::new(ExprSpec::Axis(0)),
                right: OperandSpec::Value(0.5),
            })),
            right: OperandSpec::Value(0.1),
        });

        let mut expr = spec.build(&source).unwrap();
        let snapshot = crate::mix::snapshot::Snapshot::new(vec![0.4], vec![], vec![]);
        assert!((expr.eval(&snapshot).unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_build_expression_operand() {
        let source = InputSource::new(0);
        let spec = ExprSpec::Sub(BinarySpec {
            left: Box::new(ExprSpec::Axis(0)),
            right: OperandSpec::Node(Box::new(ExprSpec::Axis(1))),
        });

        let mut expr = spec.build(&source).unwrap();
        let snapshot = crate::mix::snapshot::Snapshot::new(vec![0.5, 0.2], vec![], vec![]);
        assert!((expr.eval(&snapshot).unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_build_unit_and_negate() {
        let source = InputSource::new(0);
        let spec = ExprSpec::Unit(Box::new(ExprSpec::Negate(Box::new(ExprSpec::Axis(0)))));

        let mut expr = spec.build(&source).unwrap();
        let snapshot = crate::mix::snapshot::Snapshot::new(vec![1.0], vec![], vec![]);
        assert_eq!(expr.eval(&snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_build_rejects_bad_switch() {
        let source = InputSource::new(0);
        let spec = ExprSpec::HatSwitch(HatSwitchSpec {
            hat: 0,
            axis: HatAxisName::Y,
            positions: 1,
            initial: 0,
        });
        assert!(spec.build(&source).is_err());
    }

    #[test]
    fn test_build_channels_binds_device_index() {
        let mut config = create_valid_config();
        config.device.index = 2;
        config.channels = vec![ChannelSpec {
            name: Some("mode".to_string()),
            expr: ExprSpec::HatSwitch(HatSwitchSpec {
                hat: 0,
                axis: HatAxisName::Y,
                positions: 5,
                initial: 0,
            }),
        }];

        let (mut channels, names) = config.build_channels().unwrap();
        assert_eq!(names, vec!["mode"]);

        // Clicks from device 2 move the switch, clicks from device 0 do not
        use crate::mix::snapshot::{HatEvent, Snapshot};
        let foreign = Snapshot::new(
            vec![],
            vec![],
            vec![HatEvent { device: 0, hat: 0, x: 0, y: 1 }],
        );
        assert_eq!(channels.evaluate(&foreign).unwrap(), vec![-1.0]);

        let own = Snapshot::new(
            vec![],
            vec![],
            vec![HatEvent { device: 2, hat: 0, x: 0, y: 1 }],
        );
        assert_eq!(channels.evaluate(&own).unwrap(), vec![-0.5]);
    }
}
