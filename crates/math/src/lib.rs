#![warn(missing_docs)]
//! Geometry primitives shared by the layout engine.
//!
//! Vectors are plain [`glam::Vec3`] values. This crate adds the pieces glam
//! does not carry: tolerance-aware comparisons, per-axis access, and the
//! point/area classification of an anchor interval.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerances used when comparing layout quantities.
///
/// `number` applies to anchor fractions (and therefore to point/area
/// classification). `position` applies to sizes, offsets and positions, and
/// decides whether a recomputed value counts as a change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    /// Epsilon for anchor fractions.
    pub number: f32,
    /// Epsilon for sizes, offsets and positions.
    pub position: f32,
}

impl Precision {
    /// Default epsilon for anchor fractions.
    pub const NUMBER: f32 = 1e-5;
    /// Default epsilon for sizes, offsets and positions.
    pub const POSITION: f32 = 1e-3;

    /// Create a precision pair.
    pub const fn new(number: f32, position: f32) -> Self {
        Self { number, position }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(Self::NUMBER, Self::POSITION)
    }
}

/// One of the three layout axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
    /// Depth axis.
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis (x = 0).
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Extension helpers on [`Vec3`].
pub trait Vec3Ext {
    /// True when every component differs by at most `eps`.
    fn near_eq(self, other: Vec3, eps: f32) -> bool;

    /// Clamp every component to be `>= 0`.
    fn non_negative(self) -> Vec3;

    /// Read a single component.
    fn axis(self, axis: Axis) -> f32;

    /// Return a copy with one component replaced.
    fn with_axis(self, axis: Axis, value: f32) -> Vec3;
}

impl Vec3Ext for Vec3 {
    fn near_eq(self, other: Vec3, eps: f32) -> bool {
        Axis::ALL
            .iter()
            .all(|&a| near_eq(self.axis(a), other.axis(a), eps))
    }

    fn non_negative(self) -> Vec3 {
        self.max(Vec3::ZERO)
    }

    fn axis(self, axis: Axis) -> f32 {
        self[axis.index()]
    }

    fn with_axis(mut self, axis: Axis, value: f32) -> Vec3 {
        self[axis.index()] = value;
        self
    }
}

/// Scalar tolerance comparison (`|a - b| <= eps`).
#[inline]
pub fn near_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

/// How an anchor interval behaves on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorMode {
    /// `min ≈ max`: the node is pinned to a single point of its parent.
    Point,
    /// The node spans a fraction of its parent.
    Area,
}

impl AnchorMode {
    /// Classify a single axis.
    pub fn classify(min: f32, max: f32, eps: f32) -> Self {
        if near_eq(min, max, eps) {
            AnchorMode::Point
        } else {
            AnchorMode::Area
        }
    }
}

/// Per-axis anchor classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisModes(pub [AnchorMode; 3]);

impl AxisModes {
    /// Classify each axis of an anchor interval.
    pub fn classify(min: Vec3, max: Vec3, eps: f32) -> Self {
        Self(Axis::ALL.map(|a| AnchorMode::classify(min.axis(a), max.axis(a), eps)))
    }

    /// Mode of a single axis.
    pub fn get(&self, axis: Axis) -> AnchorMode {
        self.0[axis.index()]
    }

    /// Overall mode: `Point` only when every axis is `Point`.
    pub fn overall(&self) -> AnchorMode {
        if self.0.iter().all(|m| *m == AnchorMode::Point) {
            AnchorMode::Point
        } else {
            AnchorMode::Area
        }
    }

    /// Mask with `1.0` on area axes and `0.0` on point axes.
    pub fn area_mask(&self) -> Vec3 {
        Vec3::from_array(self.0.map(|m| match m {
            AnchorMode::Area => 1.0,
            AnchorMode::Point => 0.0,
        }))
    }
}
