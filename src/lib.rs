//! # Stickmix Library
//!
//! Mix joystick inputs into RC channels and emit them as a PPM pulse
//! train on a GPIO pin.
//!
//! This library provides the core functionality for reading a joystick
//! through the Linux evdev interface, evaluating per-channel mixing
//! expressions with multi-position switches, and driving a PPM signal
//! suitable for an RC transmitter's trainer port.

pub mod config;
pub mod error;
pub mod input;
pub mod mix;
pub mod ppm;
