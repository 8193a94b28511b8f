//! # Channel Expressions
//!
//! The composable expression tree that turns one input snapshot into one
//! channel value. Leaves read axes, buttons, or hat-driven switches;
//! inner nodes negate, normalize to unit range, or combine subtrees with
//! constants and other subtrees.
//!
//! ## Building Expressions
//!
//! Expressions are built from an [`InputSource`](super::source::InputSource)
//! and the standard arithmetic operators:
//!
//! ```
//! use stickmix::mix::source::InputSource;
//! use stickmix::mix::snapshot::Snapshot;
//!
//! let stick = InputSource::new(0);
//! let mut roll = stick.axis(0) * 0.5 + 0.1;
//!
//! let snapshot = Snapshot::new(vec![0.4], vec![], vec![]);
//! assert!((roll.eval(&snapshot).unwrap() - 0.3).abs() < 1e-6);
//! ```
//!
//! Operators take their operands by value, so a subtree (and any switch
//! state inside it) has exactly one owner. There is no clamping anywhere
//! in evaluation; out-of-range inputs flow through the arithmetic
//! unchanged.

use std::ops::{Add, Mul, Neg, Sub};

use super::snapshot::{HatAxis, Snapshot};
use super::switch::Switch;
use crate::error::Result;

/// Right-hand side of an arithmetic node: a constant or a subtree.
#[derive(Debug, PartialEq)]
pub enum Operand {
    /// A fixed value
    Const(f32),
    /// A nested expression, evaluated against the same snapshot
    Expr(Box<Expr>),
}

impl Operand {
    fn eval(&mut self, snapshot: &Snapshot) -> Result<f32> {
        match self {
            Operand::Const(value) => Ok(*value),
            Operand::Expr(expr) => expr.eval(snapshot),
        }
    }
}

/// A channel expression.
///
/// Evaluation is structural and deterministic: every node is evaluated
/// exactly once per [`eval`](Expr::eval) call, in tree order, against a
/// single snapshot. Evaluation takes `&mut self` because hat-switch
/// leaves carry position state that the snapshot's clicks advance.
#[derive(Debug, PartialEq)]
pub enum Expr {
    /// Normalized axis position
    Axis(usize),
    /// Button state as full-scale deflection: pressed = 1.0, released = -1.0
    Button(usize),
    /// Multi-position switch stepped by one hat axis
    HatSwitch {
        /// Device index the clicks must come from
        device: usize,
        /// Hat id the clicks must come from
        hat: usize,
        /// Which component of the hat tuple drives the switch
        axis: HatAxis,
        /// The embedded position state
        switch: Switch,
    },
    /// Negation of a subtree
    Neg(Box<Expr>),
    /// Normalize-to-unit: maps [-1, 1] onto [0, 1] without clamping
    Unit(Box<Expr>),
    /// Sum of a subtree and an operand
    Add(Box<Expr>, Operand),
    /// Difference of a subtree and an operand
    Sub(Box<Expr>, Operand),
    /// Product of a subtree and an operand
    Mul(Box<Expr>, Operand),
}

impl Expr {
    /// Evaluates the expression against one snapshot.
    ///
    /// Hat-switch leaves filter the snapshot's hat batch down to their
    /// own device and hat id, project the configured axis of each event,
    /// and feed the resulting clicks to the embedded switch in order.
    ///
    /// # Errors
    ///
    /// Returns [`StickmixError::DeviceRead`](crate::error::StickmixError::DeviceRead)
    /// if a leaf names an axis or button the snapshot does not have. The
    /// first error aborts the whole evaluation.
    pub fn eval(&mut self, snapshot: &Snapshot) -> Result<f32> {
        match self {
            Expr::Axis(index) => snapshot.axis(*index),
            Expr::Button(index) => Ok(if snapshot.button(*index)? { 1.0 } else { -1.0 }),
            Expr::HatSwitch {
                device,
                hat,
                axis,
                switch,
            } => {
                let clicks = snapshot
                    .hat_events()
                    .iter()
                    .filter(|event| event.device == *device && event.hat == *hat)
                    .map(|event| event.axis(*axis));
                Ok(switch.advance(clicks))
            }
            Expr::Neg(inner) => Ok(-inner.eval(snapshot)?),
            Expr::Unit(inner) => Ok(0.5 + inner.eval(snapshot)? / 2.0),
            Expr::Add(left, right) => Ok(left.eval(snapshot)? + right.eval(snapshot)?),
            Expr::Sub(left, right) => Ok(left.eval(snapshot)? - right.eval(snapshot)?),
            Expr::Mul(left, right) => Ok(left.eval(snapshot)? * right.eval(snapshot)?),
        }
    }

    /// Wraps the expression in a normalize-to-unit node.
    ///
    /// The mapping is the affine `0.5 + x / 2`: -1 becomes 0, 0 becomes
    /// 0.5, 1 becomes 1. Inputs outside [-1, 1] produce outputs outside
    /// [0, 1]; nothing clamps.
    #[must_use]
    pub fn unit_range(self) -> Expr {
        Expr::Unit(Box::new(self))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl Add<f32> for Expr {
    type Output = Expr;

    fn add(self, rhs: f32) -> Expr {
        Expr::Add(Box::new(self), Operand::Const(rhs))
    }
}

impl Add<Expr> for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Operand::Expr(Box::new(rhs)))
    }
}

impl Sub<f32> for Expr {
    type Output = Expr;

    fn sub(self, rhs: f32) -> Expr {
        Expr::Sub(Box::new(self), Operand::Const(rhs))
    }
}

impl Sub<Expr> for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Operand::Expr(Box::new(rhs)))
    }
}

impl Mul<f32> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f32) -> Expr {
        Expr::Mul(Box::new(self), Operand::Const(rhs))
    }
}

impl Mul<Expr> for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Operand::Expr(Box::new(rhs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::snapshot::HatEvent;

    fn axis_snapshot(values: &[f32]) -> Snapshot {
        Snapshot::new(values.to_vec(), vec![], vec![])
    }

    fn hat_snapshot(events: Vec<HatEvent>) -> Snapshot {
        Snapshot::new(vec![], vec![], events)
    }

    fn click(device: usize, hat: usize, y: i32) -> HatEvent {
        HatEvent {
            device,
            hat,
            x: 0,
            y,
        }
    }

    // ==================== Leaf Tests ====================

    #[test]
    fn test_axis_leaf() {
        let mut expr = Expr::Axis(1);
        let snapshot = axis_snapshot(&[0.0, 0.25]);
        assert_eq!(expr.eval(&snapshot).unwrap(), 0.25);
    }

    #[test]
    fn test_axis_leaf_out_of_range() {
        let mut expr = Expr::Axis(5);
        let snapshot = axis_snapshot(&[0.0]);
        assert!(expr.eval(&snapshot).is_err());
    }

    #[test]
    fn test_button_leaf_full_scale() {
        let mut expr = Expr::Button(0);
        let pressed = Snapshot::new(vec![], vec![true], vec![]);
        let released = Snapshot::new(vec![], vec![false], vec![]);
        assert_eq!(expr.eval(&pressed).unwrap(), 1.0);
        assert_eq!(expr.eval(&released).unwrap(), -1.0);
    }

    #[test]
    fn test_hat_switch_leaf_steps() {
        let mut expr = Expr::HatSwitch {
            device: 0,
            hat: 0,
            axis: HatAxis::Y,
            switch: Switch::new(3, 0).unwrap(),
        };
        let snapshot = hat_snapshot(vec![click(0, 0, 1)]);
        assert_eq!(expr.eval(&snapshot).unwrap(), 0.0); // moved to position 1
    }

    #[test]
    fn test_hat_switch_filters_other_hats() {
        let mut expr = Expr::HatSwitch {
            device: 0,
            hat: 0,
            axis: HatAxis::Y,
            switch: Switch::new(3, 1).unwrap(),
        };
        // Clicks on hat 1 and on another device must not move hat 0's switch
        let snapshot = hat_snapshot(vec![click(0, 1, 1), click(1, 0, 1)]);
        assert_eq!(expr.eval(&snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_hat_switch_projects_configured_axis() {
        let mut expr = Expr::HatSwitch {
            device: 0,
            hat: 0,
            axis: HatAxis::X,
            switch: Switch::new(3, 1).unwrap(),
        };
        // Pure vertical movement carries x = 0, which is a release
        let snapshot = hat_snapshot(vec![click(0, 0, 1)]);
        assert_eq!(expr.eval(&snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_hat_switch_state_persists_across_evals() {
        let mut expr = Expr::HatSwitch {
            device: 0,
            hat: 0,
            axis: HatAxis::Y,
            switch: Switch::new(3, 0).unwrap(),
        };
        let step = hat_snapshot(vec![click(0, 0, 1)]);
        let idle = hat_snapshot(vec![]);
        assert_eq!(expr.eval(&step).unwrap(), 0.0);
        assert_eq!(expr.eval(&idle).unwrap(), 0.0); // held position
        assert_eq!(expr.eval(&step).unwrap(), 1.0);
    }

    // ==================== Operator Tests ====================

    #[test]
    fn test_negation() {
        let mut expr = -Expr::Axis(0);
        let snapshot = axis_snapshot(&[0.7]);
        assert_eq!(expr.eval(&snapshot).unwrap(), -0.7);
    }

    #[test]
    fn test_scale_and_offset_chain() {
        let mut expr = Expr::Axis(0) * 0.5 + 0.1;
        let snapshot = axis_snapshot(&[0.4]);
        assert!((expr.eval(&snapshot).unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_subtract_constant() {
        let mut expr = Expr::Axis(0) - 0.25;
        let snapshot = axis_snapshot(&[0.5]);
        assert!((expr.eval(&snapshot).unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_expression_operands() {
        let mut sum = Expr::Axis(0) + Expr::Axis(1);
        let mut diff = Expr::Axis(0) - Expr::Axis(1);
        let mut product = Expr::Axis(0) * Expr::Axis(1);
        let snapshot = axis_snapshot(&[0.5, -0.25]);
        assert!((sum.eval(&snapshot).unwrap() - 0.25).abs() < 1e-6);
        assert!((diff.eval(&snapshot).unwrap() - 0.75).abs() < 1e-6);
        assert!((product.eval(&snapshot).unwrap() + 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_error_propagates_from_nested_operand() {
        let mut expr = Expr::Axis(0) + Expr::Axis(9);
        let snapshot = axis_snapshot(&[0.0]);
        assert!(expr.eval(&snapshot).is_err());
    }

    // ==================== Unit Range Tests ====================

    #[test]
    fn test_unit_range_endpoints() {
        let mut expr = Expr::Axis(0).unit_range();
        assert_eq!(expr.eval(&axis_snapshot(&[-1.0])).unwrap(), 0.0);
        assert_eq!(expr.eval(&axis_snapshot(&[0.0])).unwrap(), 0.5);
        assert_eq!(expr.eval(&axis_snapshot(&[1.0])).unwrap(), 1.0);
    }

    #[test]
    fn test_unit_range_does_not_clamp() {
        let mut expr = Expr::Axis(0).unit_range();
        assert_eq!(expr.eval(&axis_snapshot(&[3.0])).unwrap(), 2.0);
        assert_eq!(expr.eval(&axis_snapshot(&[-3.0])).unwrap(), -1.0);
    }

    // ==================== Composition Tests ====================

    #[test]
    fn test_trimmed_axis() {
        // An axis with a switch-driven trim added at half strength
        let mut expr = Expr::Axis(0)
            + Expr::HatSwitch {
                device: 0,
                hat: 0,
                axis: HatAxis::X,
                switch: Switch::new(41, 20).unwrap(),
            } * 0.5;
        let snapshot = Snapshot::new(
            vec![0.2],
            vec![],
            vec![HatEvent { device: 0, hat: 0, x: 1, y: 0 }],
        );
        // Trim moved from center (0.0) to 2*21/40-1 = 0.05, scaled to 0.025
        assert!((expr.eval(&snapshot).unwrap() - 0.225).abs() < 1e-6);
    }

    #[test]
    fn test_deep_tree_evaluates_once_per_node() {
        let mut expr = (-(Expr::Axis(0) * 2.0) + Expr::Axis(1)).unit_range();
        let snapshot = axis_snapshot(&[0.25, 0.5]);
        // -(0.25 * 2) + 0.5 = 0.0 -> unit 0.5
        assert!((expr.eval(&snapshot).unwrap() - 0.5).abs() < 1e-6);
    }
}
