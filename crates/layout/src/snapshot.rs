//! Serializable view of a resolved node tree.

use glam::Vec3;
use serde::Serialize;

use crate::info::LayoutInfo;
use crate::node::LayoutNode;

/// Resolved state of one node and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    /// Node name, if any.
    pub name: Option<String>,
    /// Lower anchor fraction.
    pub anchor_min: Vec3,
    /// Upper anchor fraction.
    pub anchor_max: Vec3,
    /// Distance added below the anchor area.
    pub offset_min: Vec3,
    /// Distance added above the anchor area.
    pub offset_max: Vec3,
    /// Constrained size.
    pub local_size: Vec3,
    /// Normalized reference point.
    pub pivot: Vec3,
    /// Pivot position in the parent-centered frame.
    pub offset: Vec3,
    /// Free-form position.
    pub local_pos: Vec3,
    /// Whether the node follows parent resizes.
    pub auto_update: bool,
    /// Size constraints and group hints.
    pub layout_info: LayoutInfo,
    /// Attached layout operations in priority order.
    pub layouts: Vec<LayoutSnapshot>,
    /// Children in insertion order.
    pub children: Vec<NodeSnapshot>,
}

/// Attached layout operation as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutSnapshot {
    /// Operation name.
    pub name: String,
    /// Sort priority, ascending.
    pub priority: i32,
}

impl NodeSnapshot {
    /// Capture `node` and its subtree.
    pub fn capture(node: &LayoutNode) -> Self {
        let anchor = node.anchor_params();
        Self {
            name: node.name(),
            anchor_min: anchor.min,
            anchor_max: anchor.max,
            offset_min: anchor.offset_min,
            offset_max: anchor.offset_max,
            local_size: node.local_size(),
            pivot: node.pivot(),
            offset: node.offset(),
            local_pos: node.local_pos(),
            auto_update: node.is_auto_update(),
            layout_info: node.layout_info(),
            layouts: node
                .layouts()
                .iter()
                .map(|l| LayoutSnapshot {
                    name: l.name().to_string(),
                    priority: l.priority(),
                })
                .collect(),
            children: node.children().iter().map(NodeSnapshot::capture).collect(),
        }
    }

    /// Find a node in this subtree by name.
    pub fn find(&self, name: &str) -> Option<&NodeSnapshot> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}
