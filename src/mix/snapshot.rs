//! # Input Snapshot
//!
//! One cycle's view of a joystick: normalized axis positions, button
//! states, and the hat events observed since the previous cycle, in
//! arrival order.

use crate::error::{Result, StickmixError};

/// One axis of a hat (POV switch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatAxis {
    /// Horizontal axis (left = -1, right = +1)
    X,
    /// Vertical axis (up = -1, down = +1)
    Y,
}

/// A single hat movement.
///
/// Carries the source device index, the hat id on that device, and the
/// full (x, y) value tuple as reported by the driver. Hat values are
/// -1, 0, or +1 on typical hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatEvent {
    /// Index of the device that produced the event
    pub device: usize,
    /// Hat id on that device (0 for the first hat)
    pub hat: usize,
    /// Horizontal component
    pub x: i32,
    /// Vertical component
    pub y: i32,
}

impl HatEvent {
    /// Projects one component of the value tuple.
    ///
    /// # Examples
    ///
    /// ```
    /// use stickmix::mix::snapshot::{HatAxis, HatEvent};
    ///
    /// let event = HatEvent { device: 0, hat: 0, x: 1, y: -1 };
    /// assert_eq!(event.axis(HatAxis::X), 1);
    /// assert_eq!(event.axis(HatAxis::Y), -1);
    /// ```
    #[must_use]
    pub fn axis(&self, axis: HatAxis) -> i32 {
        match axis {
            HatAxis::X => self.x,
            HatAxis::Y => self.y,
        }
    }
}

/// Immutable per-cycle view of device state.
///
/// Axis values are normalized to [-1, 1] by the state tracker before
/// they reach a snapshot; the snapshot itself stores what it is given
/// and never clamps. The hat batch preserves arrival order exactly,
/// with no deduplication or coalescing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Normalized axis positions, indexed by axis number
    axes: Vec<f32>,
    /// Button pressed states, indexed by button number
    buttons: Vec<bool>,
    /// Hat events since the previous cycle, in arrival order
    hats: Vec<HatEvent>,
}

impl Snapshot {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(axes: Vec<f32>, buttons: Vec<bool>, hats: Vec<HatEvent>) -> Self {
        Self {
            axes,
            buttons,
            hats,
        }
    }

    /// Number of axes in the snapshot.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of buttons in the snapshot.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Returns the normalized position of an axis.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::DeviceRead`] if `index` is not an axis
    /// the device reported. There is no default value for a missing axis.
    pub fn axis(&self, index: usize) -> Result<f32> {
        self.axes.get(index).copied().ok_or_else(|| {
            StickmixError::DeviceRead(format!(
                "axis {} out of range ({} axes)",
                index,
                self.axes.len()
            ))
        })
    }

    /// Returns the pressed state of a button.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::DeviceRead`] if `index` is not a button
    /// the device reported.
    pub fn button(&self, index: usize) -> Result<bool> {
        self.buttons.get(index).copied().ok_or_else(|| {
            StickmixError::DeviceRead(format!(
                "button {} out of range ({} buttons)",
                index,
                self.buttons.len()
            ))
        })
    }

    /// The hat events observed since the previous cycle, in arrival order.
    #[must_use]
    pub fn hat_events(&self) -> &[HatEvent] {
        &self.hats
    }
}
