#![warn(missing_docs)]
//! Anchor-based layout tree.
//!
//! Each [`LayoutNode`] derives its size and pivot offset from anchor
//! fractions of its parent's size plus fixed offsets, constrained by its
//! [`LayoutInfo`]. Parent resizes flow down to auto-updating children, and
//! every observable attribute exposes an [`Event`](anchorkit_events::Event).
//!
//! # Example
//!
//! ```rust
//! use anchorkit_layout::{AnchorParams, LayoutNode};
//! use glam::Vec3;
//!
//! let panel = LayoutNode::named("panel");
//! panel.set_local_size(Vec3::splat(100.0));
//!
//! let inset = LayoutNode::named("inset");
//! inset.set_parent(Some(&panel)).unwrap();
//! inset.update_anchor_param(
//!     AnchorParams::stretch().with_offsets(Vec3::splat(-10.0), Vec3::splat(-10.0)),
//! );
//! assert_eq!(inset.local_size(), Vec3::splat(80.0));
//! ```

pub mod anchor;
mod error;
pub mod info;
mod node;
pub mod registry;
pub mod snapshot;
pub mod stack;

pub use anchor::{AnchorParams, Resolved};
pub use error::LayoutError;
pub use info::{LayoutInfo, LayoutInfoFlags, UNFIXED};
pub use node::{
    ChildChanged, LayoutChanged, LayoutInfoChanged, LayoutNode, NodeEvents, ParentChanged,
    ValueChanged, VecPair, WeakLayoutNode,
};
pub use registry::{Layout, LayoutCapabilities, LayoutEvents, LayoutOperation, PriorityChanged};
pub use snapshot::{LayoutSnapshot, NodeSnapshot};
pub use stack::{Placement, StackLayout};

pub use anchorkit_events::{DispatchReport, Event, ListenerId};
pub use anchorkit_math::{AnchorMode, Axis, AxisModes, Precision, Vec3Ext};
