//! # PPM Frame Encoder
//!
//! Converts normalized channel values into pulse widths.
//!
//! All conversions map linearly from [-1, 1] onto the configured
//! microsecond range. This is the only place values are clamped: the
//! mixing engine passes through whatever the expressions produce, and
//! the wire range is enforced here.

use crate::config::PpmConfig;

/// One frame of channel pulse widths, in microseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PpmFrame {
    /// Channel widths in output order
    pub channels: Vec<u16>,
}

/// Converts a batch of normalized channel values into a frame.
///
/// # Arguments
///
/// * `values` - Normalized channel values in output order
/// * `config` - PPM timing parameters
///
/// # Examples
///
/// ```
/// use stickmix::config::PpmConfig;
/// use stickmix::ppm::encoder::encode_frame;
///
/// let config = PpmConfig {
///     pin: 24,
///     channel_min_us: 1000,
///     channel_max_us: 2000,
///     pulse_us: 300,
///     frame_us: 20_000,
///     invert: false,
/// };
/// let frame = encode_frame(&[-1.0, 0.0, 1.0], &config);
/// assert_eq!(frame.channels, vec![1000, 1500, 2000]);
/// ```
#[must_use]
pub fn encode_frame(values: &[f32], config: &PpmConfig) -> PpmFrame {
    PpmFrame {
        channels: values
            .iter()
            .map(|&value| convert_channel_value(value, config))
            .collect(),
    }
}

/// Maps one normalized value onto the configured pulse width range.
///
/// -1.0 maps to `channel_min_us`, +1.0 to `channel_max_us`, linearly in
/// between. Values outside [-1, 1] are clamped to the range endpoints.
/// NaN falls back to the center width.
///
/// # Arguments
///
/// * `value` - Normalized channel value
/// * `config` - PPM timing parameters
///
/// # Returns
///
/// * `u16` - Pulse width in microseconds
#[must_use]
pub fn convert_channel_value(value: f32, config: &PpmConfig) -> u16 {
    let min = f32::from(config.channel_min_us);
    let max = f32::from(config.channel_max_us);
    let center = (min + max) / 2.0;
    let half_span = (max - min) / 2.0;
    let value = if value.is_nan() { 0.0 } else { value };

    (center + value * half_span).clamp(min, max).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PpmConfig {
        PpmConfig {
            pin: 24,
            channel_min_us: 1000,
            channel_max_us: 2000,
            pulse_us: 300,
            frame_us: 20_000,
            invert: false,
        }
    }

    // ==================== Conversion Tests ====================

    #[test]
    fn test_convert_endpoints() {
        let config = test_config();
        assert_eq!(convert_channel_value(-1.0, &config), 1000);
        assert_eq!(convert_channel_value(0.0, &config), 1500);
        assert_eq!(convert_channel_value(1.0, &config), 2000);
    }

    #[test]
    fn test_convert_intermediate_values() {
        let config = test_config();
        assert_eq!(convert_channel_value(-0.5, &config), 1250);
        assert_eq!(convert_channel_value(0.5, &config), 1750);
    }

    #[test]
    fn test_convert_clamps_out_of_range() {
        let config = test_config();
        assert_eq!(convert_channel_value(-3.0, &config), 1000);
        assert_eq!(convert_channel_value(1.5, &config), 2000);
        assert_eq!(convert_channel_value(f32::INFINITY, &config), 2000);
        assert_eq!(convert_channel_value(f32::NEG_INFINITY, &config), 1000);
    }

    #[test]
    fn test_convert_nan_maps_to_center() {
        let config = test_config();
        assert_eq!(convert_channel_value(f32::NAN, &config), 1500);
        assert_eq!(encode_frame(&[f32::NAN], &config).channels, vec![1500]);
    }

    #[test]
    fn test_convert_asymmetric_range() {
        let config = PpmConfig {
            channel_min_us: 900,
            channel_max_us: 2100,
            ..test_config()
        };
        assert_eq!(convert_channel_value(-1.0, &config), 900);
        assert_eq!(convert_channel_value(0.0, &config), 1500);
        assert_eq!(convert_channel_value(1.0, &config), 2100);
    }

    // ==================== Frame Tests ====================

    #[test]
    fn test_encode_frame_preserves_order() {
        let frame = encode_frame(&[1.0, -1.0, 0.0], &test_config());
        assert_eq!(frame.channels, vec![2000, 1000, 1500]);
    }

    #[test]
    fn test_encode_empty_frame() {
        let frame = encode_frame(&[], &test_config());
        assert!(frame.channels.is_empty());
    }

    #[test]
    fn test_encode_frame_clamps_each_channel() {
        let frame = encode_frame(&[-2.0, 2.0], &test_config());
        assert_eq!(frame.channels, vec![1000, 2000]);
    }
}
