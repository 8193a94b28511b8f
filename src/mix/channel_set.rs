//! # Channel Set
//!
//! The ordered list of channel expressions. One evaluation pass runs
//! every channel, in declaration order, exactly once against the same
//! snapshot, so switch state embedded in the expressions sees each hat
//! batch once and only once.

use super::expr::Expr;
use super::snapshot::Snapshot;
use crate::error::Result;

/// An ordered set of output channels.
///
/// # Examples
///
/// ```
/// use stickmix::mix::channel_set::ChannelSet;
/// use stickmix::mix::snapshot::Snapshot;
/// use stickmix::mix::source::InputSource;
///
/// let stick = InputSource::new(0);
/// let mut channels = ChannelSet::new(vec![stick.axis(0), -stick.axis(1)]);
///
/// let snapshot = Snapshot::new(vec![0.2, 0.7], vec![], vec![]);
/// assert_eq!(channels.evaluate(&snapshot).unwrap(), vec![0.2, -0.7]);
/// ```
#[derive(Debug, Default)]
pub struct ChannelSet {
    /// Channel expressions in output order
    channels: Vec<Expr>,
}

impl ChannelSet {
    /// Creates a channel set from expressions in output order.
    #[must_use]
    pub fn new(channels: Vec<Expr>) -> Self {
        Self { channels }
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the set has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Evaluates every channel against one snapshot.
    ///
    /// Channels run in declaration order, each exactly once. The output
    /// vector always has [`len`](ChannelSet::len) entries on success.
    ///
    /// # Errors
    ///
    /// The first channel error aborts the pass and propagates. Channels
    /// after the failing one are not evaluated.
    pub fn evaluate(&mut self, snapshot: &Snapshot) -> Result<Vec<f32>> {
        let mut values = Vec::with_capacity(self.channels.len());
        for channel in &mut self.channels {
            values.push(channel.eval(snapshot)?);
        }
        Ok(values)
    }
}
