//! # Multi-Position Switch
//!
//! A click-driven position latch. Hat clicks step the position forward
//! or backward with wraparound, and the current position is reported as
//! a value in [-1, 1] with the positions spread evenly across the range.
//!
//! ## Value Mapping
//!
//! | Positions | Position 0 | Position 1 | Position 2 |
//! |-----------|------------|------------|------------|
//! | 2 | -1.0 | 1.0 | |
//! | 3 | -1.0 | 0.0 | 1.0 |

use crate::error::{Result, StickmixError};

/// A multi-position switch stepped by hat clicks.
///
/// Clicks come in as signed values from a hat axis: positive steps
/// forward, negative steps backward, zero (the hat returning to rest)
/// is ignored. Stepping wraps in both directions.
///
/// # Examples
///
/// ```
/// use stickmix::mix::switch::Switch;
///
/// let mut arm = Switch::new(2, 0).unwrap();
/// assert_eq!(arm.advance([]), -1.0);
/// assert_eq!(arm.advance([1]), 1.0);
/// assert_eq!(arm.advance([1]), -1.0); // wraps
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    /// Total number of positions (at least 2)
    positions: usize,
    /// Current position, always in 0..positions
    position: usize,
}

impl Switch {
    /// Creates a switch with `positions` stops, starting at `initial`.
    ///
    /// # Arguments
    ///
    /// * `positions` - Number of stops, at least 2
    /// * `initial` - Starting position, in `0..positions`
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::InvalidConfiguration`] if `positions`
    /// is less than 2 or `initial` is out of range.
    pub fn new(positions: usize, initial: usize) -> Result<Self> {
        if positions < 2 {
            return Err(StickmixError::InvalidConfiguration(format!(
                "a switch needs at least 2 positions, got {positions}"
            )));
        }
        if initial >= positions {
            return Err(StickmixError::InvalidConfiguration(format!(
                "initial position {initial} out of range for {positions}-position switch"
            )));
        }
        Ok(Self {
            positions,
            position: initial,
        })
    }

    /// Applies a batch of clicks in order, then reports the position value.
    ///
    /// Each positive click steps forward (wrapping past the last position
    /// to the first), each negative click steps backward (wrapping past
    /// the first to the last), and zero-valued clicks are ignored. An
    /// empty batch leaves the position unchanged and just reports it.
    ///
    /// # Returns
    ///
    /// The current position mapped onto [-1, 1]:
    /// `2 * position / (positions - 1) - 1`.
    pub fn advance<I>(&mut self, clicks: I) -> f32
    where
        I: IntoIterator<Item = i32>,
    {
        for click in clicks {
            if click > 0 {
                self.position = (self.position + 1) % self.positions;
            } else if click < 0 {
                self.position = if self.position == 0 {
                    self.positions - 1
                } else {
                    self.position - 1
                };
            }
            // click == 0 is the hat returning to rest
        }
        self.value()
    }

    /// The current position mapped onto [-1, 1].
    #[must_use]
    pub fn value(&self) -> f32 {
        2.0 * self.position as f32 / (self.positions - 1) as f32 - 1.0
    }

    /// Total number of positions.
    #[must_use]
    pub fn positions(&self) -> usize {
        self.positions
    }

    /// Current position index.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}
