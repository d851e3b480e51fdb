//! TOML scene files describing a layout tree.
//!
//! The file itself is the root node; children nest as `[[children]]`,
//! `[[children.children]]` and so on.
//!
//! ```toml
//! name = "window"
//! size = [200.0, 100.0, 0.0]
//!
//! [[children]]
//! name = "body"
//! anchor_min = [0.0, 0.0, 0.0]
//! anchor_max = [1.0, 1.0, 0.0]
//! offset_min = [-8.0, -8.0, 0.0]
//! offset_max = [-8.0, -8.0, 0.0]
//! ```

use anchorkit_layout::{
    AnchorParams, Axis, Layout, LayoutInfo, LayoutNode, Precision, StackLayout,
};
use anyhow::{bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

/// One node of a scene file and its subtree.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneNode {
    pub name: Option<String>,
    pub anchor_min: Vec3,
    pub anchor_max: Vec3,
    pub offset_min: Vec3,
    pub offset_max: Vec3,
    /// Requested size, applied after the anchors.
    pub size: Option<Vec3>,
    pub pivot: Vec3,
    pub local_pos: Vec3,
    pub auto_update: bool,
    pub layout: LayoutInfo,
    pub stack: Option<StackSpec>,
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        let anchor = AnchorParams::default();
        Self {
            name: None,
            anchor_min: anchor.min,
            anchor_max: anchor.max,
            offset_min: anchor.offset_min,
            offset_max: anchor.offset_max,
            size: None,
            pivot: Vec3::splat(0.5),
            local_pos: Vec3::ZERO,
            auto_update: true,
            layout: LayoutInfo::default(),
            stack: None,
            children: Vec::new(),
        }
    }
}

/// Stack layout attached to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackSpec {
    pub axis: Axis,
    pub spacing: f32,
    pub padding: f32,
    pub priority: i32,
}

impl Default for StackSpec {
    fn default() -> Self {
        let stack = StackLayout::default();
        Self {
            axis: stack.axis,
            spacing: stack.spacing,
            padding: stack.padding,
            priority: 0,
        }
    }
}

impl StackSpec {
    fn to_layout(self) -> Layout {
        Layout::new(
            self.priority,
            StackLayout::along(self.axis)
                .with_spacing(self.spacing)
                .with_padding(self.padding),
        )
    }
}

/// Read and validate a scene file.
pub fn load(path: &Path) -> Result<SceneNode> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene {}", path.display()))?;
    parse(&contents).with_context(|| format!("Invalid scene {}", path.display()))
}

/// Parse and validate scene TOML.
pub fn parse(contents: &str) -> Result<SceneNode> {
    let scene: SceneNode = toml::from_str(contents).context("Failed to parse scene TOML")?;
    scene.validate("root")?;
    Ok(scene)
}

impl SceneNode {
    fn anchor_params(&self) -> AnchorParams {
        AnchorParams::new(
            self.anchor_min,
            self.anchor_max,
            self.offset_min,
            self.offset_max,
        )
    }

    fn label<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    fn validate(&self, path: &str) -> Result<()> {
        let label = self.label(path);
        let mut fields = vec![
            ("anchor_min", self.anchor_min),
            ("anchor_max", self.anchor_max),
            ("offset_min", self.offset_min),
            ("offset_max", self.offset_max),
            ("pivot", self.pivot),
            ("local_pos", self.local_pos),
            ("layout.min_size", self.layout.min_size),
            ("layout.max_size", self.layout.max_size),
            ("layout.layout_size", self.layout.layout_size),
        ];
        if let Some(size) = self.size {
            fields.push(("size", size));
        }
        for (field, value) in fields {
            if !value.is_finite() {
                bail!("Node `{label}`: {field} must be finite, got {value:?}");
            }
        }
        if !self.layout.size_grow_in_group.is_finite() || self.layout.size_grow_in_group < 0.0 {
            bail!(
                "Node `{label}`: layout.size_grow_in_group must be a non-negative number, got {}",
                self.layout.size_grow_in_group
            );
        }
        if let Some(stack) = &self.stack {
            if !stack.spacing.is_finite() || !stack.padding.is_finite() {
                bail!("Node `{label}`: stack spacing and padding must be finite");
            }
        }
        for (index, child) in self.children.iter().enumerate() {
            child.validate(&format!("{label}/{index}"))?;
        }
        Ok(())
    }

    /// Build the node tree. Stack layouts run once the subtree exists.
    pub fn build(&self, precision: Precision) -> Result<LayoutNode> {
        self.build_under(None, precision)
    }

    fn build_under(&self, parent: Option<&LayoutNode>, precision: Precision) -> Result<LayoutNode> {
        let node = LayoutNode::with_precision(precision);
        node.set_name(self.name.clone());
        node.set_parent(parent)
            .with_context(|| format!("Failed to attach `{node}`"))?;

        node.set_pivot(self.pivot);
        node.update_anchor_param(self.anchor_params());
        node.assign_layout_info(self.layout);
        if let Some(size) = self.size {
            node.set_local_size(size);
        }
        node.set_local_pos(self.local_pos);

        for child in &self.children {
            child.build_under(Some(&node), precision)?;
        }

        if let Some(stack) = self.stack {
            let layout = stack.to_layout();
            node.add_layout(&layout);
            layout.update_layout();
            debug!(node = %node, valid = layout.validate(), "applied stack layout");
        }

        node.set_auto_update(self.auto_update);
        Ok(node)
    }
}

/// Resize `root` and run every stack layout in the tree, parents first.
pub fn resize(root: &LayoutNode, size: Vec3) {
    root.set_local_size(size);
    refresh_layouts(root);
}

/// Re-run the layouts attached to `node` and its descendants.
pub fn refresh_layouts(node: &LayoutNode) {
    for layout in node.layouts() {
        layout.update_layout();
    }
    for child in node.children() {
        refresh_layouts(&child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = r#"
name = "panel"
size = [100.0, 40.0, 0.0]

[[children]]
name = "body"
anchor_min = [0.0, 0.0, 0.0]
anchor_max = [1.0, 1.0, 0.0]
offset_min = [-5.0, -5.0, 0.0]
offset_max = [-5.0, -5.0, 0.0]
"#;

    #[test]
    fn defaults_match_a_fresh_node() {
        let scene = parse("").unwrap();
        let node = scene.build(Precision::default()).unwrap();
        let fresh = LayoutNode::new();
        assert_eq!(node.anchor_params(), fresh.anchor_params());
        assert_eq!(node.pivot(), fresh.pivot());
        assert_eq!(node.layout_info(), fresh.layout_info());
        assert!(node.is_auto_update());
    }

    #[test]
    fn children_resolve_against_their_parent() {
        let root = parse(PANEL).unwrap().build(Precision::default()).unwrap();
        let body = root.child(0).unwrap();
        assert_eq!(body.name().as_deref(), Some("body"));
        assert_eq!(body.local_size(), Vec3::new(90.0, 30.0, 0.0));

        resize(&root, Vec3::new(50.0, 50.0, 0.0));
        assert_eq!(body.local_size(), Vec3::new(40.0, 40.0, 0.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse("nmae = \"typo\"").unwrap_err();
        assert!(format!("{err:#}").contains("nmae"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = parse("name = \"bad\"\npivot = [nan, 0.5, 0.5]").unwrap_err();
        assert!(err.to_string().contains("pivot"), "{err}");
    }

    #[test]
    fn stack_spec_builds_a_stack_layout() {
        let scene = parse(
            r#"
size = [60.0, 10.0, 0.0]
stack = { axis = "y", spacing = 2.0, priority = 3 }
"#,
        )
        .unwrap();
        let node = scene.build(Precision::default()).unwrap();
        let layouts = node.layouts();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].name(), "stack");
        assert_eq!(layouts[0].priority(), 3);
    }

    #[test]
    fn stack_axis_uses_lowercase_names() {
        let scene = parse("stack = { axis = \"z\" }").unwrap();
        assert_eq!(scene.stack.map(|s| s.axis), Some(Axis::Z));

        let err = parse("stack = { axis = \"Z\" }").unwrap_err();
        assert!(format!("{err:#}").contains("unknown variant"), "{err:#}");
    }
}
