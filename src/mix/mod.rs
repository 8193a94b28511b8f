//! # Mixing Engine
//!
//! The deterministic channel-mixing core.
//!
//! This module handles:
//! - Per-cycle input snapshots (axes, buttons, ordered hat events)
//! - Composable channel expressions with arithmetic operators
//! - Multi-position switches stepped by hat clicks
//! - Ordered evaluation of a channel set, once per cycle
//!
//! The engine is pure with respect to I/O: it consumes snapshots built
//! elsewhere and produces one f32 per channel. Same snapshot sequence
//! in, same channel values out.

pub mod channel_set;
pub mod expr;
pub mod snapshot;
pub mod source;
pub mod switch;
