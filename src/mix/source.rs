//! # Input Source
//!
//! Builder for leaf expressions bound to one joystick. An `InputSource`
//! is a pure index binding; creating one performs no I/O, and the
//! expressions it hands out read whatever snapshot they are later
//! evaluated against.

use super::expr::Expr;
use super::snapshot::HatAxis;
use super::switch::Switch;
use crate::error::Result;

/// A joystick binding from which leaf expressions are built.
///
/// # Examples
///
/// ```
/// use stickmix::mix::snapshot::HatAxis;
/// use stickmix::mix::source::InputSource;
///
/// let stick = InputSource::new(0);
/// let roll = stick.axis(0);
/// let arm = stick.button(2);
/// let mode = stick.hat_switch(0, HatAxis::Y, 5, 0).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSource {
    /// Device index this source is bound to
    device: usize,
}

impl InputSource {
    /// Creates a source bound to a device index.
    #[must_use]
    pub fn new(device: usize) -> Self {
        Self { device }
    }

    /// The device index this source is bound to.
    #[must_use]
    pub fn device(&self) -> usize {
        self.device
    }

    /// An expression reading one normalized axis.
    #[must_use]
    pub fn axis(&self, index: usize) -> Expr {
        Expr::Axis(index)
    }

    /// An expression reading one button as full-scale deflection.
    #[must_use]
    pub fn button(&self, index: usize) -> Expr {
        Expr::Button(index)
    }

    /// An expression holding a multi-position switch stepped by one hat
    /// axis of this device.
    ///
    /// # Arguments
    ///
    /// * `hat` - Hat id on the device (0 for the first hat)
    /// * `axis` - Which component of the hat tuple drives the switch
    /// * `positions` - Number of stops, at least 2
    /// * `initial` - Starting position, in `0..positions`
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::InvalidConfiguration`](crate::error::StickmixError::InvalidConfiguration)
    /// if the switch definition is invalid.
    pub fn hat_switch(
        &self,
        hat: usize,
        axis: HatAxis,
        positions: usize,
        initial: usize,
    ) -> Result<Expr> {
        Ok(Expr::HatSwitch {
            device: self.device,
            hat,
            axis,
            switch: Switch::new(positions, initial)?,
        })
    }
}
