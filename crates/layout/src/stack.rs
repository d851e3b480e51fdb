//! Linear group layout driven by the `LayoutInfo` group hints.

use anchorkit_math::{Axis, Vec3Ext};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::info::is_fixed;
use crate::node::LayoutNode;
use crate::registry::{LayoutCapabilities, LayoutOperation};

/// Places a node's children one after another along an axis.
///
/// Children flagged `ignore_layout_group` are left alone. The rest are sorted
/// by `order_in_group` (stable), inset by `padding` and separated by
/// `spacing`. Leftover space goes to children with a positive
/// `size_grow_in_group`, proportionally; a growing child's base length is its
/// fixed `min_size` on that axis, or zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackLayout {
    /// Stacking direction.
    pub axis: Axis,
    /// Gap between consecutive children.
    pub spacing: f32,
    /// Inset from both ends of the parent.
    pub padding: f32,
}

impl Default for StackLayout {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            spacing: 0.0,
            padding: 0.0,
        }
    }
}

/// Target geometry for one stacked child.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Child being placed.
    pub node: LayoutNode,
    /// Size the child should take.
    pub size: Vec3,
    /// Pivot position the child should take.
    pub offset: Vec3,
}

impl StackLayout {
    /// Stack along `axis` with no spacing or padding.
    pub fn along(axis: Axis) -> Self {
        Self {
            axis,
            ..Default::default()
        }
    }

    /// Builder: set the gap between children.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Builder: set the inset at both ends.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Compute where every participating child should go.
    pub fn plan(&self, target: &LayoutNode) -> Vec<Placement> {
        let axis = self.axis;
        let extent = target.effective_size().axis(axis);

        let mut members: Vec<LayoutNode> = target
            .children()
            .into_iter()
            .filter(|c| !c.layout_info().ignore_layout_group)
            .collect();
        members.sort_by_key(|c| c.layout_info().order_in_group);
        if members.is_empty() {
            return Vec::new();
        }

        let base_lengths: Vec<f32> = members
            .iter()
            .map(|c| {
                let info = c.layout_info();
                if info.size_grow_in_group > 0.0 {
                    let min = info.min_size.axis(axis);
                    if is_fixed(min) {
                        min
                    } else {
                        0.0
                    }
                } else {
                    c.local_size().axis(axis)
                }
            })
            .collect();
        let gaps = self.spacing * (members.len() - 1) as f32;
        let available = extent - 2.0 * self.padding - gaps;
        let leftover = (available - base_lengths.iter().sum::<f32>()).max(0.0);
        let total_grow: f32 = members
            .iter()
            .map(|c| c.layout_info().size_grow_in_group.max(0.0))
            .sum();

        let mut cursor = -extent * 0.5 + self.padding;
        members
            .into_iter()
            .zip(base_lengths)
            .map(|(node, base)| {
                let info = node.layout_info();
                let grow = info.size_grow_in_group.max(0.0);
                let mut length = base;
                if total_grow > 0.0 && grow > 0.0 {
                    length += leftover * grow / total_grow;
                }
                let size = info.clamp(node.local_size().with_axis(axis, length));
                let length = size.axis(axis);
                let pivot = node.pivot().axis(axis);
                let offset = node.offset().with_axis(axis, cursor + length * pivot);
                cursor += length + self.spacing;
                Placement { node, size, offset }
            })
            .collect()
    }
}

impl LayoutOperation for StackLayout {
    fn name(&self) -> &str {
        "stack"
    }

    fn capabilities(&self) -> LayoutCapabilities {
        match self.axis {
            Axis::X => LayoutCapabilities::POS_X | LayoutCapabilities::SIZE_X,
            Axis::Y => LayoutCapabilities::POS_Y | LayoutCapabilities::SIZE_Y,
            Axis::Z => LayoutCapabilities::POS_Z | LayoutCapabilities::SIZE_Z,
        }
    }

    fn update_layout(&mut self, target: &LayoutNode) {
        for placement in self.plan(target) {
            placement
                .node
                .update_local_size(placement.size, placement.offset);
        }
    }

    fn validate(&self, target: &LayoutNode) -> bool {
        let eps = target.precision().position;
        self.plan(target).iter().all(|p| {
            p.node.local_size().near_eq(p.size, eps) && p.node.offset().near_eq(p.offset, eps)
        })
    }
}
