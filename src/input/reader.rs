//! # Event Reader
//!
//! Pumps evdev events from a joystick into a channel on a dedicated
//! thread, so the blocking `fetch_events` call never touches the async
//! runtime.
//!
//! The channel closing signals the device is gone: either the read
//! side failed (device unplugged) or the receiver was dropped.

use evdev::{Device, InputEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Starts the event pump for a device.
///
/// The returned receiver yields raw events in arrival order. When the
/// device read fails the pump logs a warning and stops, closing the
/// channel. Dropping the receiver stops the pump on its next event.
///
/// The thread parks inside the kernel read between events, so it is
/// left detached rather than joined on shutdown.
///
/// # Arguments
///
/// * `device` - An opened evdev device, typically from
///   [`Joystick::into_device`](super::joystick::Joystick::into_device)
///
/// # Returns
///
/// Receiver for the device's event stream
pub fn spawn(mut device: Device) -> mpsc::UnboundedReceiver<InputEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || loop {
        match device.fetch_events() {
            Ok(events) => {
                for event in events {
                    if tx.send(event).is_err() {
                        debug!("Event receiver dropped, stopping event pump");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("Device read failed, stopping event pump: {}", e);
                return;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::joystick::Joystick;

    #[tokio::test]
    #[ignore] // Requires a joystick at /dev/input; move the stick once started
    async fn test_pump_delivers_events() {
        let stick = Joystick::open(0).unwrap();
        let mut rx = spawn(stick.into_device());

        let event = rx.recv().await;
        assert!(event.is_some(), "Expected at least one event from the device");
    }
}
