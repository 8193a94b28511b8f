//! # Input Module
//!
//! Joystick handling via the Linux evdev interface.
//!
//! This module handles:
//! - Device discovery and capability probing ([`joystick`])
//! - Pumping raw events off the blocking evdev read ([`reader`])
//! - Turning events into per-cycle snapshots ([`state`])

pub mod joystick;
pub mod reader;
pub mod state;
