//! Per-node size constraints.

use anchorkit_math::{Axis, Vec3Ext};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Sentinel for an unconstrained axis. Any negative value means the same.
pub const UNFIXED: f32 = -1.0;

/// True when `value` constrains its axis.
#[inline]
pub fn is_fixed(value: f32) -> bool {
    value >= 0.0
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Which parts of a [`LayoutInfo`] changed.
    pub struct LayoutInfoFlags: u8 {
        const MIN_SIZE = 0b0000_0001;
        const MAX_SIZE = 0b0000_0010;
        const LAYOUT_SIZE = 0b0000_0100;
        const IGNORE_LAYOUT_GROUP = 0b0000_1000;
        const SIZE_GROW_IN_GROUP = 0b0001_0000;
        const ORDER_IN_GROUP = 0b0010_0000;
        /// Fields that affect the size of the node or of its children.
        const SIZE = Self::MIN_SIZE.bits() | Self::MAX_SIZE.bits() | Self::LAYOUT_SIZE.bits();
    }
}

impl Default for LayoutInfoFlags {
    fn default() -> Self {
        LayoutInfoFlags::empty()
    }
}

/// Size constraints and group hints attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutInfo {
    /// Lower bound per axis; negative means unconstrained.
    pub min_size: Vec3,
    /// Upper bound per axis; negative means unconstrained.
    pub max_size: Vec3,
    /// Fixed size children see instead of this node's own size.
    pub layout_size: Vec3,
    /// Group layouts skip this node.
    pub ignore_layout_group: bool,
    /// Share of leftover space a group layout hands to this node.
    pub size_grow_in_group: f32,
    /// Sort key inside a group layout.
    pub order_in_group: i32,
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self {
            min_size: Vec3::splat(UNFIXED),
            max_size: Vec3::splat(UNFIXED),
            layout_size: Vec3::splat(UNFIXED),
            ignore_layout_group: false,
            size_grow_in_group: 0.0,
            order_in_group: 0,
        }
    }
}

impl LayoutInfo {
    /// Constrain a candidate size: min first, then max, so max wins a conflict.
    pub fn clamp(&self, candidate: Vec3) -> Vec3 {
        let mut out = candidate;
        for axis in Axis::ALL {
            let mut v = out.axis(axis);
            let min = self.min_size.axis(axis);
            if is_fixed(min) {
                v = v.max(min);
            }
            let max = self.max_size.axis(axis);
            if is_fixed(max) {
                v = v.min(max);
            }
            out = out.with_axis(axis, v);
        }
        out
    }

    /// Size children compute their anchors against, given this node's own size.
    ///
    /// A fixed `layout_size` axis replaces the raw size; a fixed `min_size`
    /// axis then acts as a floor.
    pub fn effective_size(&self, local_size: Vec3) -> Vec3 {
        let mut out = local_size;
        for axis in Axis::ALL {
            let mut v = out.axis(axis);
            let layout = self.layout_size.axis(axis);
            if is_fixed(layout) {
                v = layout;
            }
            let min = self.min_size.axis(axis);
            if is_fixed(min) {
                v = v.max(min);
            }
            out = out.with_axis(axis, v);
        }
        out
    }

    /// Set of fields that differ from `other`.
    pub fn diff(&self, other: &LayoutInfo) -> LayoutInfoFlags {
        let mut flags = LayoutInfoFlags::empty();
        if !same_vec(self.min_size, other.min_size) {
            flags |= LayoutInfoFlags::MIN_SIZE;
        }
        if !same_vec(self.max_size, other.max_size) {
            flags |= LayoutInfoFlags::MAX_SIZE;
        }
        if !same_vec(self.layout_size, other.layout_size) {
            flags |= LayoutInfoFlags::LAYOUT_SIZE;
        }
        if self.ignore_layout_group != other.ignore_layout_group {
            flags |= LayoutInfoFlags::IGNORE_LAYOUT_GROUP;
        }
        if self.size_grow_in_group != other.size_grow_in_group {
            flags |= LayoutInfoFlags::SIZE_GROW_IN_GROUP;
        }
        if self.order_in_group != other.order_in_group {
            flags |= LayoutInfoFlags::ORDER_IN_GROUP;
        }
        flags
    }
}

// Two unfixed values compare equal regardless of which negative number they hold.
fn same_vec(a: Vec3, b: Vec3) -> bool {
    Axis::ALL.iter().all(|&axis| {
        let (x, y) = (a.axis(axis), b.axis(axis));
        (!is_fixed(x) && !is_fixed(y)) || x == y
    })
}
