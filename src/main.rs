//! # Stickmix
//!
//! Mix joystick inputs into RC channels and emit them as a PPM pulse
//! train on a GPIO pin.
//!
//! This application reads a joystick through the Linux evdev interface,
//! evaluates the configured channel mix every cycle, and drives a PPM
//! signal suitable for an RC transmitter's trainer port.

use anyhow::Result;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{interval, Duration};
use tracing::info;
use tracing_subscriber;

use stickmix::config::Config;
use stickmix::error::StickmixError;
use stickmix::input::joystick::Joystick;
use stickmix::input::reader;
use stickmix::input::state::InputState;
use stickmix::ppm::encoder::encode_frame;
use stickmix::ppm::output::PpmOutput;

/// Configuration file read when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of cycles between status log messages
const LOG_INTERVAL_CYCLES: u64 = 250;

/// Main entry point for the stickmix application
///
/// Initializes the application and runs the control loop that applies
/// joystick events, evaluates the channel mix, and hands frames to the
/// PPM output worker.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load the TOML configuration
///    - Open the joystick and probe its layout
///    - Build the channel expressions and claim the GPIO pin
///
/// 2. **Main Loop**
///    - Each cycle: apply pending events, snapshot the device state,
///      evaluate all channels, encode and publish the PPM frame
///    - Log status every 250 cycles (~5 seconds at 50Hz)
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the PPM worker and release the GPIO pin
///    - Log total cycle count
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is missing or invalid
/// - The configured joystick is not present
/// - The GPIO pin cannot be claimed
/// - The joystick disconnects while running
/// - A channel expression references an axis or button the device
///   does not have
///
/// # Examples
///
/// Run the application:
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO stickmix: Stickmix v0.1.0 starting...
/// INFO stickmix::input::joystick: Found joystick 0: Logitech Extreme 3D at /dev/input/event5
/// INFO stickmix::ppm::output: PPM output started on GPIO 24 (20000 us frames, invert: false)
/// INFO stickmix: Starting mixing loop at 50Hz
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Stickmix v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    // Open the joystick and probe its shape
    let stick = Joystick::open(config.device.index)?;
    let layout = stick.layout()?;
    info!(
        "Using {} at {}: {} axes, {} buttons, {} hats",
        stick.name().unwrap_or("unnamed joystick"),
        stick.path().display(),
        layout.axes.len(),
        layout.buttons.len(),
        layout.hats
    );

    let mut tracker = InputState::new(config.device.index, &layout);
    let mut events = reader::spawn(stick.into_device());

    let (mut channels, names) = config.build_channels()?;
    info!("Mixing {} channels: {}", channels.len(), names.join(", "));

    // Emit centered channels until the first cycle completes
    let ppm = PpmOutput::spawn(
        &config.ppm,
        encode_frame(&vec![0.0; channels.len()], &config.ppm),
    )?;

    let period_us = 1_000_000 / u64::from(config.cycle.rate_hz);
    let mut cycle_interval = interval(Duration::from_micros(period_us));

    info!("Starting mixing loop at {}Hz", config.cycle.rate_hz);
    info!("Press Ctrl+C to exit");

    let mut cycle_count: u64 = 0;
    let mut last_log_count: u64 = 0;

    // Main control loop
    let outcome = 'run: loop {
        tokio::select! {
            // Evaluate one cycle at the configured rate
            _ = cycle_interval.tick() => {
                // Apply everything that arrived since the last tick
                loop {
                    match events.try_recv() {
                        Ok(event) => tracker.apply(&event),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            break 'run Err(StickmixError::DeviceRead(
                                "joystick event stream closed".into(),
                            ));
                        }
                    }
                }

                let snapshot = tracker.snapshot();
                let values = match channels.evaluate(&snapshot) {
                    Ok(values) => values,
                    Err(e) => break 'run Err(e),
                };
                ppm.send(encode_frame(&values, &config.ppm));
                tracker.end_cycle();

                cycle_count += 1;

                // Log status every LOG_INTERVAL_CYCLES (~5 seconds at 50Hz)
                if cycle_count - last_log_count >= LOG_INTERVAL_CYCLES {
                    info!("Completed {} cycles ({}Hz)", cycle_count, config.cycle.rate_hz);
                    last_log_count = cycle_count;
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total cycles: {}", cycle_count);
                break 'run Ok(());
            }
        }
    };

    ppm.shutdown();
    outcome?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_CYCLES, 250);

        // At the default 50Hz cycle rate, 250 cycles = 5 seconds
        let seconds = LOG_INTERVAL_CYCLES as f64 / 50.0;
        assert_eq!(seconds, 5.0, "Log interval should be 5 seconds at 50Hz");
    }

    #[test]
    fn test_default_config_path() {
        assert!(DEFAULT_CONFIG_PATH.ends_with(".toml"));
    }

    #[test]
    fn test_cycle_period_calculation() {
        // Verify period calculation for the default 50Hz rate
        let period_us = 1_000_000 / 50u64;
        assert_eq!(period_us, 20_000, "Period should be 20ms at 50Hz");
    }
}
