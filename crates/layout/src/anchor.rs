//! Anchor geometry.
//!
//! All positions here live in the parent-centered frame: the parent's
//! effective size `P` spans `[-P/2, P/2]` on each axis. An axis whose anchors
//! coincide (point mode) collapses the anchor area onto the parent's center.

use anchorkit_math::{AnchorMode, AxisModes, Vec3Ext};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Anchor fractions and the outward offsets added to them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorParams {
    /// Lower anchor fraction of the parent size.
    pub min: Vec3,
    /// Upper anchor fraction of the parent size.
    pub max: Vec3,
    /// Distance added below the anchor area.
    pub offset_min: Vec3,
    /// Distance added above the anchor area.
    pub offset_max: Vec3,
}

impl Default for AnchorParams {
    fn default() -> Self {
        Self {
            min: Vec3::splat(0.5),
            max: Vec3::splat(0.5),
            offset_min: Vec3::ZERO,
            offset_max: Vec3::ZERO,
        }
    }
}

/// Size and pivot placement produced by a forward computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    /// `local_max - local_min`, clamped to `>= 0` but not yet constrained.
    pub size: Vec3,
    /// Position of the pivot point in the parent-centered frame.
    pub offset: Vec3,
}

impl AnchorParams {
    /// Build parameters from all four vectors.
    pub fn new(min: Vec3, max: Vec3, offset_min: Vec3, offset_max: Vec3) -> Self {
        Self {
            min,
            max,
            offset_min,
            offset_max,
        }
    }

    /// Stretch over the full parent with no offsets.
    pub fn stretch() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE, Vec3::ZERO, Vec3::ZERO)
    }

    /// Replace the anchor interval.
    pub fn with_anchors(mut self, min: Vec3, max: Vec3) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Replace the anchor offsets.
    pub fn with_offsets(mut self, offset_min: Vec3, offset_max: Vec3) -> Self {
        self.offset_min = offset_min;
        self.offset_max = offset_max;
        self
    }

    /// Per-axis point/area classification.
    pub fn modes(&self, eps: f32) -> AxisModes {
        AxisModes::classify(self.min, self.max, eps)
    }

    /// Overall anchor mode.
    pub fn mode(&self, eps: f32) -> AnchorMode {
        self.modes(eps).overall()
    }

    /// Size of the anchor area; zero on point axes.
    pub fn anchor_area_size(&self, parent: Vec3, eps: f32) -> Vec3 {
        parent * (self.max - self.min) * self.modes(eps).area_mask()
    }

    /// Lower and upper corners of the anchor area.
    ///
    /// Full stretch (`0..1`) yields exactly `[-P/2, P/2]`.
    pub fn anchor_area_min_max_pos(&self, parent: Vec3, eps: f32) -> (Vec3, Vec3) {
        let mask = self.modes(eps).area_mask();
        let half = parent * 0.5;
        let min = (parent * self.min - half) * mask;
        let max = (parent * self.max - half) * mask;
        (min, max)
    }

    /// Anchor area grown outward by the offsets.
    pub fn local_area_min_max_pos(&self, parent: Vec3, eps: f32) -> (Vec3, Vec3) {
        let (area_min, area_max) = self.anchor_area_min_max_pos(parent, eps);
        (area_min - self.offset_min, area_max + self.offset_max)
    }

    /// Forward computation: derive size and pivot offset from the parameters.
    pub fn resolve(&self, parent: Vec3, pivot: Vec3, eps: f32) -> Resolved {
        let (local_min, local_max) = self.local_area_min_max_pos(parent, eps);
        Resolved {
            size: (local_max - local_min).non_negative(),
            offset: pivot_point(local_min, local_max, pivot),
        }
    }

    /// Reverse computation: offsets that give `size` with the pivot point at
    /// `offset`, keeping the anchor interval as is.
    pub fn solve_offsets(
        &self,
        parent: Vec3,
        size: Vec3,
        offset: Vec3,
        pivot: Vec3,
        eps: f32,
    ) -> Self {
        let (area_min, area_max) = self.anchor_area_min_max_pos(parent, eps);
        let local_min = offset - size * pivot;
        let local_max = offset + size * (Vec3::ONE - pivot);
        Self {
            offset_min: area_min - local_min,
            offset_max: local_max - area_max,
            ..*self
        }
    }
}

/// Interpolate the pivot point between the two local area corners.
pub fn pivot_point(local_min: Vec3, local_max: Vec3, pivot: Vec3) -> Vec3 {
    local_min * (Vec3::ONE - pivot) + local_max * pivot
}
