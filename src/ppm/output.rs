//! # PPM Output
//!
//! Drives the PPM pulse train on a GPIO pin from a dedicated worker
//! thread.
//!
//! This module handles:
//! - GPIO pin setup with configurable polarity
//! - Repeating the latest frame until a new one arrives
//! - Microsecond pulse timing via coarse sleep plus a short spin
//!
//! ## Waveform
//!
//! Each channel starts with a fixed-width marker pulse; the distance
//! between marker starts encodes the channel value. A trailing marker
//! closes the last channel, and the remainder of the frame is the sync
//! gap the receiver locks onto:
//!
//! ```text
//! ██______██________██____██  . . . sync gap . . .
//! |--ch1--|---ch2---|
//! ```

use rppal::gpio::{Gpio, OutputPin};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::encoder::PpmFrame;
use crate::config::PpmConfig;
use crate::error::{Result, StickmixError};

/// Trait for the output pin so the waveform generator can be tested
/// without GPIO hardware.
trait PulsePin: Send {
    /// Drive the pin to the marker level
    fn set_active(&mut self);

    /// Drive the pin to the resting level
    fn set_idle(&mut self);
}

/// Real GPIO pin. Polarity is applied here so the waveform generator
/// only thinks in active/idle.
struct GpioPin {
    pin: OutputPin,
    invert: bool,
}

impl PulsePin for GpioPin {
    fn set_active(&mut self) {
        if self.invert {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn set_idle(&mut self) {
        if self.invert {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

/// Handle to the running PPM output worker.
///
/// The worker repeats the most recently sent frame at the configured
/// frame length until [`PpmOutput::shutdown`] is called, so the pulse
/// train never stalls between updates.
pub struct PpmOutput {
    frame_tx: watch::Sender<PpmFrame>,
    worker: JoinHandle<()>,
}

impl PpmOutput {
    /// Claims the configured GPIO pin and starts the waveform worker.
    ///
    /// The pin starts at the resting level and the worker immediately
    /// begins emitting `initial`.
    ///
    /// # Arguments
    ///
    /// * `config` - PPM timing parameters
    /// * `initial` - Frame to emit until the first update arrives
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::Gpio`] when the GPIO controller or the
    /// configured pin is unavailable.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stickmix::config::PpmConfig;
    /// use stickmix::ppm::encoder::encode_frame;
    /// use stickmix::ppm::output::PpmOutput;
    ///
    /// # fn main() -> stickmix::error::Result<()> {
    /// let config = PpmConfig {
    ///     pin: 24,
    ///     channel_min_us: 1000,
    ///     channel_max_us: 2000,
    ///     pulse_us: 300,
    ///     frame_us: 20_000,
    ///     invert: false,
    /// };
    /// let output = PpmOutput::spawn(&config, encode_frame(&[0.0; 8], &config))?;
    /// output.send(encode_frame(&[0.5; 8], &config));
    /// output.shutdown();
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(config: &PpmConfig, initial: PpmFrame) -> Result<PpmOutput> {
        let gpio = Gpio::new().map_err(|e| StickmixError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(config.pin)
            .map_err(|e| StickmixError::Gpio(format!("pin {}: {}", config.pin, e)))?;

        // Resting level depends on polarity
        let pin = if config.invert {
            pin.into_output_high()
        } else {
            pin.into_output_low()
        };

        info!(
            "PPM output started on GPIO {} ({} us frames, invert: {})",
            config.pin, config.frame_us, config.invert
        );

        let (frame_tx, frame_rx) = watch::channel(initial);
        let mut pin = GpioPin {
            pin,
            invert: config.invert,
        };
        let pulse = Duration::from_micros(u64::from(config.pulse_us));
        let frame_len = Duration::from_micros(u64::from(config.frame_us));

        let worker = thread::Builder::new()
            .name("ppm-output".into())
            .spawn(move || run_waveform(&mut pin, frame_rx, pulse, frame_len))?;

        Ok(PpmOutput { frame_tx, worker })
    }

    /// Replaces the frame the worker repeats.
    ///
    /// Takes effect at the next frame boundary. Sending faster than the
    /// frame rate is fine, only the latest frame is emitted.
    pub fn send(&self, frame: PpmFrame) {
        self.frame_tx.send_replace(frame);
    }

    /// Stops the pulse train and waits for the worker to finish.
    ///
    /// Returns once the frame in progress has completed.
    pub fn shutdown(self) {
        drop(self.frame_tx);
        if self.worker.join().is_err() {
            warn!("PPM output thread panicked during shutdown");
        }
    }
}

impl std::fmt::Debug for PpmOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PpmOutput").finish_non_exhaustive()
    }
}

/// Worker loop: emits the latest frame back to back until the sender
/// side is dropped.
fn run_waveform<P: PulsePin>(
    pin: &mut P,
    mut frame_rx: watch::Receiver<PpmFrame>,
    pulse: Duration,
    frame_len: Duration,
) {
    loop {
        if frame_rx.has_changed().is_err() {
            break;
        }
        // Clone out so the sender never waits on a frame in progress
        let frame = frame_rx.borrow_and_update().clone();
        emit_frame(pin, &frame, pulse, frame_len);
    }
    pin.set_idle();
    debug!("Frame source dropped, stopping PPM output");
}

/// Emits one complete frame: a marker per channel, a trailing marker,
/// then the sync gap up to the full frame length.
fn emit_frame<P: PulsePin>(pin: &mut P, frame: &PpmFrame, pulse: Duration, frame_len: Duration) {
    let start = Instant::now();
    let mut deadline = start;

    for &width_us in &frame.channels {
        pin.set_active();
        deadline += pulse;
        sleep_until(deadline);
        pin.set_idle();
        deadline += Duration::from_micros(u64::from(width_us)).saturating_sub(pulse);
        sleep_until(deadline);
    }

    pin.set_active();
    deadline += pulse;
    sleep_until(deadline);
    pin.set_idle();

    sleep_until(start + frame_len);
}

/// Sleeps until an absolute deadline.
///
/// `thread::sleep` alone overshoots by scheduler latency, which is too
/// coarse for pulse timing. The last stretch before the deadline is
/// spun instead.
fn sleep_until(deadline: Instant) {
    const SPIN_WINDOW: Duration = Duration::from_micros(200);

    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_WINDOW {
            thread::sleep(remaining - SPIN_WINDOW);
        } else {
            std::hint::spin_loop();
        }
    }
}
