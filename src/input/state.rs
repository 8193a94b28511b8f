//! # Input State Tracker
//!
//! Applies raw evdev events to per-device state and produces the
//! per-cycle snapshots the mixing engine consumes.
//!
//! ## Responsibilities
//!
//! - Normalize raw axis values to [-1, 1] using the driver's reported
//!   range (the one place normalization happens)
//! - Track button pressed state
//! - Accumulate hat events between cycles, in arrival order, carrying
//!   the full (x, y) tuple per movement
//!
//! Axis and button state persist across cycles; the hat batch is
//! cleared by [`InputState::end_cycle`] after each snapshot has been
//! evaluated.

use evdev::{InputEvent, InputEventKind};
use std::collections::HashMap;

use super::joystick::{is_hat_code, DeviceLayout, HAT_CODE_FIRST};
use crate::mix::snapshot::{HatEvent, Snapshot};

/// Lookup entry for one regular axis.
#[derive(Debug, Clone, Copy)]
struct AxisSlot {
    index: usize,
    min: i32,
    max: i32,
}

/// Accumulates device state between snapshots.
///
/// Built from a [`DeviceLayout`], so slot numbering and axis ranges
/// match what the hardware actually reports. Events whose codes the
/// layout does not know are ignored.
#[derive(Debug)]
pub struct InputState {
    /// Device index stamped onto hat events
    device: usize,
    /// Normalized axis values, indexed by axis slot
    axes: Vec<f32>,
    /// ABS code to axis slot lookup
    axis_slots: HashMap<u16, AxisSlot>,
    /// Button pressed state, indexed by button slot
    buttons: Vec<bool>,
    /// Key code to button slot lookup
    button_slots: HashMap<u16, usize>,
    /// Current (x, y) tuple per hat
    hat_values: Vec<(i32, i32)>,
    /// Hat events since the last cycle end, in arrival order
    hat_batch: Vec<HatEvent>,
}

impl InputState {
    /// Creates a tracker for one device.
    ///
    /// Axes start centered (0.0), buttons released, hats at rest.
    ///
    /// # Arguments
    ///
    /// * `device` - Device index stamped onto hat events
    /// * `layout` - The device's shape from [`Joystick::layout`](super::joystick::Joystick::layout)
    #[must_use]
    pub fn new(device: usize, layout: &DeviceLayout) -> Self {
        let mut axis_slots = HashMap::new();
        for (index, range) in layout.axes.iter().enumerate() {
            axis_slots.insert(
                range.code,
                AxisSlot {
                    index,
                    min: range.min,
                    max: range.max,
                },
            );
        }

        let mut button_slots = HashMap::new();
        for (index, code) in layout.buttons.iter().enumerate() {
            button_slots.insert(*code, index);
        }

        Self {
            device,
            axes: vec![0.0; layout.axes.len()],
            axis_slots,
            buttons: vec![false; layout.buttons.len()],
            button_slots,
            hat_values: vec![(0, 0); layout.hats],
            hat_batch: Vec::new(),
        }
    }

    /// Applies a single evdev event.
    ///
    /// Hat axis events update the hat's (x, y) tuple and append the full
    /// tuple to the current batch. Regular axis events are normalized
    /// and stored. Key events update button state. Everything else
    /// (sync, unknown codes) is ignored.
    pub fn apply(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                let code = axis.0;
                if is_hat_code(code) {
                    self.apply_hat(code, event.value());
                } else if let Some(slot) = self.axis_slots.get(&code) {
                    self.axes[slot.index] = normalize_axis(event.value(), slot.min, slot.max);
                }
            }
            InputEventKind::Key(key) => {
                if let Some(&slot) = self.button_slots.get(&key.code()) {
                    self.buttons[slot] = event.value() != 0;
                }
            }
            _ => {
                // Ignore sync events and other event types
            }
        }
    }

    /// Updates one hat axis and records the movement.
    fn apply_hat(&mut self, code: u16, value: i32) {
        let offset = code - HAT_CODE_FIRST;
        let hat = (offset / 2) as usize;
        if hat >= self.hat_values.len() {
            return;
        }

        if offset % 2 == 0 {
            self.hat_values[hat].0 = value;
        } else {
            self.hat_values[hat].1 = value;
        }

        let (x, y) = self.hat_values[hat];
        self.hat_batch.push(HatEvent {
            device: self.device,
            hat,
            x,
            y,
        });
    }

    /// The current state plus the accumulated hat batch, as one snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.axes.clone(),
            self.buttons.clone(),
            self.hat_batch.clone(),
        )
    }

    /// Closes the cycle: clears the hat batch.
    ///
    /// Axis and button state carry over to the next cycle.
    pub fn end_cycle(&mut self) {
        self.hat_batch.clear();
    }
}

/// Maps a raw axis value onto [-1, 1] using the driver's range.
///
/// A degenerate range (min not below max) reads as centered.
fn normalize_axis(value: i32, min: i32, max: i32) -> f32 {
    if min >= max {
        return 0.0;
    }
    2.0 * (value - min) as f32 / (max - min) as f32 - 1.0
}
