//! # PPM Module
//!
//! Pulse-position modulation output.
//!
//! This module handles:
//! - Converting normalized channel values to pulse widths ([`encoder`])
//! - Generating the pulse train on a GPIO pin ([`output`])

pub mod encoder;
pub mod output;
