//! Layout nodes: hierarchy, geometry state and change notifications.
//!
//! A [`LayoutNode`] is a cheap, clonable handle. Children are held strongly by
//! their parent; the parent link is weak, so dropping the last handle to a
//! parent orphans its children instead of keeping it alive.
//!
//! The stored anchor parameters are the source of truth. `local_size` and
//! `offset` are derived from them (against the parent size captured at the
//! last resolve) and cached. Every mutation finishes its structural or
//! numeric update before any listener runs.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use anchorkit_events::{DispatchReport, Event, ListenerId};
use anchorkit_math::{AnchorMode, Precision, Vec3Ext};
use glam::Vec3;
use tracing::{debug, trace};

use crate::anchor::AnchorParams;
use crate::error::LayoutError;
use crate::info::{LayoutInfo, LayoutInfoFlags};
use crate::registry::Layout;

/// Arguments of [`NodeEvents::parent_changed`].
#[derive(Debug, Clone)]
pub struct ParentChanged {
    /// Node whose parent changed.
    pub node: LayoutNode,
    /// Parent after the change.
    pub new_parent: Option<LayoutNode>,
    /// Parent before the change.
    pub old_parent: Option<LayoutNode>,
}

/// Arguments of [`NodeEvents::child_added`] and [`NodeEvents::child_removed`].
#[derive(Debug, Clone)]
pub struct ChildChanged {
    /// Node whose child list changed.
    pub parent: LayoutNode,
    /// Child that was added or removed.
    pub child: LayoutNode,
}

/// Arguments of every single-value change event.
#[derive(Debug, Clone)]
pub struct ValueChanged<T> {
    /// Node that changed.
    pub node: LayoutNode,
    /// Value before the change.
    pub previous: T,
    /// Value after the change.
    pub current: T,
}

/// Arguments of [`NodeEvents::layout_info_changed`].
#[derive(Debug, Clone)]
pub struct LayoutInfoChanged {
    /// Node whose constraints changed.
    pub node: LayoutNode,
    /// Fields that changed.
    pub flags: LayoutInfoFlags,
    /// Constraints before the change.
    pub previous: LayoutInfo,
}

/// Arguments of [`NodeEvents::layout_added`] and [`NodeEvents::layout_removed`].
#[derive(Debug, Clone)]
pub struct LayoutChanged {
    /// Node the layout was attached to or detached from.
    pub node: LayoutNode,
    /// The layout itself.
    pub layout: Layout,
}

/// Pair of vectors reported by the anchor events (`min`, `max`).
pub type VecPair = (Vec3, Vec3);

/// Registration points for every observable attribute of a node.
#[derive(Debug, Default)]
pub struct NodeEvents {
    /// Parent link changed.
    pub parent_changed: Event<ParentChanged>,
    /// A child was attached.
    pub child_added: Event<ChildChanged>,
    /// A child was detached.
    pub child_removed: Event<ChildChanged>,
    /// `local_size` changed.
    pub local_size_changed: Event<ValueChanged<Vec3>>,
    /// `offset` changed.
    pub offset_changed: Event<ValueChanged<Vec3>>,
    /// `pivot` changed.
    pub pivot_changed: Event<ValueChanged<Vec3>>,
    /// `local_pos` changed.
    pub local_pos_changed: Event<ValueChanged<Vec3>>,
    /// Anchor interval changed.
    pub anchor_changed: Event<ValueChanged<VecPair>>,
    /// Anchor offsets changed.
    pub anchor_offset_changed: Event<ValueChanged<VecPair>>,
    /// Size constraints or group hints changed.
    pub layout_info_changed: Event<LayoutInfoChanged>,
    /// Auto-update flag toggled.
    pub auto_update_changed: Event<ValueChanged<bool>>,
    /// A layout operation was attached.
    pub layout_added: Event<LayoutChanged>,
    /// A layout operation was detached.
    pub layout_removed: Event<LayoutChanged>,
    /// The node was disposed. Fires once.
    pub disposed: Event<LayoutNode>,
}

impl NodeEvents {
    fn close_all(&self) {
        self.parent_changed.close();
        self.child_added.close();
        self.child_removed.close();
        self.local_size_changed.close();
        self.offset_changed.close();
        self.pivot_changed.close();
        self.local_pos_changed.close();
        self.anchor_changed.close();
        self.anchor_offset_changed.close();
        self.layout_info_changed.close();
        self.auto_update_changed.close();
        self.layout_added.close();
        self.layout_removed.close();
        self.disposed.close();
    }
}

struct AttachedLayout {
    layout: Layout,
    seq: u64,
    disposed_hook: ListenerId,
    priority_hook: ListenerId,
}

struct NodeState {
    name: Option<String>,
    parent: Weak<NodeInner>,
    children: Vec<LayoutNode>,
    anchor: AnchorParams,
    /// Parent size the cached geometry was resolved against.
    basis: Vec3,
    local_size: Vec3,
    pivot: Vec3,
    offset: Vec3,
    local_pos: Vec3,
    info: LayoutInfo,
    layouts: Vec<AttachedLayout>,
    next_layout_seq: u64,
    auto_update: bool,
    disposed: bool,
    precision: Precision,
}

pub(crate) struct NodeInner {
    state: RefCell<NodeState>,
    events: NodeEvents,
}

/// Handle to a node in the layout tree. Equality is identity.
#[derive(Clone)]
pub struct LayoutNode(Rc<NodeInner>);

/// Non-owning handle to a [`LayoutNode`].
#[derive(Clone, Default)]
pub struct WeakLayoutNode(Weak<NodeInner>);

impl WeakLayoutNode {
    /// Recover a strong handle if the node is still alive.
    pub fn upgrade(&self) -> Option<LayoutNode> {
        self.0.upgrade().map(LayoutNode)
    }
}

impl fmt::Debug for WeakLayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "WeakLayoutNode({node})"),
            None => f.write_str("WeakLayoutNode(<dropped>)"),
        }
    }
}

impl PartialEq for LayoutNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for LayoutNode {}

impl Hash for LayoutNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Display for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.state.borrow().name {
            Some(name) => f.write_str(name),
            None => write!(f, "node@{:p}", Rc::as_ptr(&self.0)),
        }
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("LayoutNode")
            .field("name", &state.name)
            .field("local_size", &state.local_size)
            .field("offset", &state.offset)
            .field("children", &state.children.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl Default for LayoutNode {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutNode {
    /// Create a detached node with default precision.
    pub fn new() -> Self {
        Self::with_precision(Precision::default())
    }

    /// Create a detached node with explicit tolerances.
    pub fn with_precision(precision: Precision) -> Self {
        Self(Rc::new(NodeInner {
            state: RefCell::new(NodeState {
                name: None,
                parent: Weak::new(),
                children: Vec::new(),
                anchor: AnchorParams::default(),
                basis: Vec3::ZERO,
                local_size: Vec3::ZERO,
                pivot: Vec3::splat(0.5),
                offset: Vec3::ZERO,
                local_pos: Vec3::ZERO,
                info: LayoutInfo::default(),
                layouts: Vec::new(),
                next_layout_seq: 0,
                auto_update: true,
                disposed: false,
                precision,
            }),
            events: NodeEvents::default(),
        }))
    }

    /// Create a detached node carrying a name for logs and snapshots.
    pub fn named(name: impl Into<String>) -> Self {
        let node = Self::new();
        node.set_name(Some(name.into()));
        node
    }

    /// Non-owning handle to this node.
    pub fn downgrade(&self) -> WeakLayoutNode {
        WeakLayoutNode(Rc::downgrade(&self.0))
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &LayoutNode) -> bool {
        self == other
    }

    /// Registration points for change notifications.
    pub fn events(&self) -> &NodeEvents {
        &self.0.events
    }

    /// Optional display name.
    pub fn name(&self) -> Option<String> {
        self.0.state.borrow().name.clone()
    }

    /// Replace the display name.
    pub fn set_name(&self, name: Option<String>) {
        self.0.state.borrow_mut().name = name;
    }

    /// Tolerances used by this node.
    pub fn precision(&self) -> Precision {
        self.0.state.borrow().precision
    }

    /// Replace the tolerances used by this node.
    pub fn set_precision(&self, precision: Precision) {
        self.0.state.borrow_mut().precision = precision;
    }

    /// Whether [`LayoutNode::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.0.state.borrow().disposed
    }

    // === Hierarchy ===

    /// Current parent, if any.
    pub fn parent(&self) -> Option<LayoutNode> {
        self.0.state.borrow().parent.upgrade().map(LayoutNode)
    }

    /// Snapshot of the children in order.
    pub fn children(&self) -> Vec<LayoutNode> {
        self.0.state.borrow().children.clone()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.0.state.borrow().children.len()
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Option<LayoutNode> {
        self.0.state.borrow().children.get(index).cloned()
    }

    /// Topmost ancestor (the node itself when it has no parent).
    pub fn root(&self) -> LayoutNode {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// True when `other` sits somewhere below this node.
    pub fn is_ancestor_of(&self, other: &LayoutNode) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Every node below this one, depth-first pre-order.
    pub fn descendants(&self) -> Vec<LayoutNode> {
        let mut out = Vec::new();
        let mut stack: Vec<LayoutNode> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Attach to `new_parent`, or detach with `None`.
    ///
    /// Anchor parameters are kept as raw numbers. An auto-updating node
    /// re-resolves against its new parent once the edge is in place.
    pub fn set_parent(&self, new_parent: Option<&LayoutNode>) -> Result<(), LayoutError> {
        let old_parent = self.parent();
        if old_parent.as_ref() == new_parent {
            return Ok(());
        }
        if let Some(parent) = new_parent {
            if parent == self {
                return Err(LayoutError::SelfParent);
            }
            if self.is_ancestor_of(parent) {
                return Err(LayoutError::Cycle);
            }
        }

        if let Some(old) = &old_parent {
            old.0.state.borrow_mut().children.retain(|c| c != self);
        }
        self.0.state.borrow_mut().parent = new_parent
            .map(|p| Rc::downgrade(&p.0))
            .unwrap_or_default();
        if let Some(parent) = new_parent {
            parent.0.state.borrow_mut().children.push(self.clone());
        }

        debug!(
            node = %self,
            old = ?old_parent.as_ref().map(|p| p.to_string()),
            new = ?new_parent.map(|p| p.to_string()),
            "reparented layout node"
        );

        if let Some(old) = &old_parent {
            let report = old.0.events.child_removed.invoke(&ChildChanged {
                parent: old.clone(),
                child: self.clone(),
            });
            log_faults(old, "child_removed", report);
        }
        let report = self.0.events.parent_changed.invoke(&ParentChanged {
            node: self.clone(),
            new_parent: new_parent.cloned(),
            old_parent: old_parent.clone(),
        });
        log_faults(self, "parent_changed", report);
        if let Some(parent) = new_parent {
            let report = parent.0.events.child_added.invoke(&ChildChanged {
                parent: parent.clone(),
                child: self.clone(),
            });
            log_faults(parent, "child_added", report);
        }

        if new_parent.is_some() && self.is_auto_update() {
            self.follow_parent();
        }
        Ok(())
    }

    /// Detach from the parent, orphan the children, fire `disposed` once and
    /// drop every listener. Later calls do nothing.
    ///
    /// The node stays usable afterwards; mutations simply notify nobody.
    pub fn dispose(&self) {
        {
            let mut state = self.0.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        debug!(node = %self, "disposing layout node");

        // Detaching from no parent cannot fail.
        let _ = self.set_parent(None);

        let children = std::mem::take(&mut self.0.state.borrow_mut().children);
        for child in &children {
            child.0.state.borrow_mut().parent = Weak::new();
        }
        drop(children);

        let report = self.0.events.disposed.invoke(self);
        log_faults(self, "disposed", report);
        self.0.events.close_all();

        for layout in self.layouts() {
            self.remove_layout(&layout);
        }
    }

    // === Geometry accessors ===

    /// Lower anchor fraction.
    pub fn anchor_min(&self) -> Vec3 {
        self.0.state.borrow().anchor.min
    }

    /// Upper anchor fraction.
    pub fn anchor_max(&self) -> Vec3 {
        self.0.state.borrow().anchor.max
    }

    /// Anchor interval as `(min, max)`.
    pub fn anchor_min_max(&self) -> VecPair {
        let state = self.0.state.borrow();
        (state.anchor.min, state.anchor.max)
    }

    /// Anchor offsets as `(offset_min, offset_max)`.
    pub fn anchor_offset_min_max(&self) -> VecPair {
        let state = self.0.state.borrow();
        (state.anchor.offset_min, state.anchor.offset_max)
    }

    /// All stored anchor parameters.
    pub fn anchor_params(&self) -> AnchorParams {
        self.0.state.borrow().anchor
    }

    /// Overall anchor mode.
    pub fn anchor_mode(&self) -> AnchorMode {
        let state = self.0.state.borrow();
        state.anchor.mode(state.precision.number)
    }

    /// Derived, constrained size. Never negative.
    pub fn local_size(&self) -> Vec3 {
        self.0.state.borrow().local_size
    }

    /// Normalized reference point within the node's size.
    pub fn pivot(&self) -> Vec3 {
        self.0.state.borrow().pivot
    }

    /// Position of the pivot point relative to the parent's center.
    pub fn offset(&self) -> Vec3 {
        self.0.state.borrow().offset
    }

    /// Free-form position value.
    pub fn local_pos(&self) -> Vec3 {
        self.0.state.borrow().local_pos
    }

    /// Size constraints.
    pub fn layout_info(&self) -> LayoutInfo {
        self.0.state.borrow().info
    }

    /// Whether the node follows its parent's size changes.
    pub fn is_auto_update(&self) -> bool {
        self.0.state.borrow().auto_update
    }

    /// Size children resolve their anchors against.
    pub fn effective_size(&self) -> Vec3 {
        let state = self.0.state.borrow();
        state.info.effective_size(state.local_size)
    }

    /// Anchor area size against the current parent size.
    pub fn anchor_area_size(&self) -> Vec3 {
        let parent = self.parent_size();
        let state = self.0.state.borrow();
        state.anchor.anchor_area_size(parent, state.precision.number)
    }

    /// Anchor area corners against the current parent size.
    pub fn anchor_area_min_max_pos(&self) -> VecPair {
        let parent = self.parent_size();
        let state = self.0.state.borrow();
        state.anchor.anchor_area_min_max_pos(parent, state.precision.number)
    }

    /// Anchor area grown by the offsets, against the current parent size.
    pub fn local_area_min_max_pos(&self) -> VecPair {
        let parent = self.parent_size();
        let state = self.0.state.borrow();
        state.anchor.local_area_min_max_pos(parent, state.precision.number)
    }

    fn parent_size(&self) -> Vec3 {
        self.parent()
            .map(|p| p.effective_size())
            .unwrap_or(Vec3::ZERO)
    }

    // === Geometry mutation ===

    /// Replace all anchor parameters and resolve size and offset against
    /// the parent's current size.
    pub fn update_anchor_param(&self, params: AnchorParams) {
        let parent = self.parent_size();
        let (size, offset) = {
            let state = self.0.state.borrow();
            let resolved = params.resolve(parent, state.pivot, state.precision.number);
            (state.info.clamp(resolved.size), resolved.offset)
        };
        trace!(node = %self, ?parent, ?size, ?offset, "resolved anchors");
        self.commit(params, parent, size, offset);
    }

    /// Replace the anchor interval, keeping the offsets.
    pub fn set_anchor(&self, min: Vec3, max: Vec3) {
        let params = self.anchor_params().with_anchors(min, max);
        self.update_anchor_param(params);
    }

    /// Replace the anchor offsets, keeping the interval.
    pub fn set_anchor_offset(&self, offset_min: Vec3, offset_max: Vec3) {
        let params = self.anchor_params().with_offsets(offset_min, offset_max);
        self.update_anchor_param(params);
    }

    /// Resize while keeping the anchors and the pivot point fixed; the
    /// anchor offsets are solved to reproduce the requested size.
    pub fn set_local_size(&self, size: Vec3) {
        let size = size.non_negative();
        let (params, basis, clamped, offset) = {
            let state = self.0.state.borrow();
            let params = state.anchor.solve_offsets(
                state.basis,
                size,
                state.offset,
                state.pivot,
                state.precision.number,
            );
            (params, state.basis, state.info.clamp(size), state.offset)
        };
        self.commit(params, basis, clamped, offset);
    }

    /// Store size and offset directly, re-deriving the anchor offsets so
    /// that a later resolve reproduces them.
    pub fn update_local_size(&self, size: Vec3, offset: Vec3) {
        let size = size.non_negative();
        let (params, basis, clamped) = {
            let state = self.0.state.borrow();
            let params = state.anchor.solve_offsets(
                state.basis,
                size,
                offset,
                state.pivot,
                state.precision.number,
            );
            (params, state.basis, state.info.clamp(size))
        };
        self.commit(params, basis, clamped, offset);
    }

    /// Change the pivot. Size and anchor offsets stay; only `offset` moves.
    pub fn set_pivot(&self, pivot: Vec3) {
        let (previous, offset) = {
            let mut state = self.0.state.borrow_mut();
            let previous = state.pivot;
            if previous.near_eq(pivot, state.precision.number) {
                return;
            }
            state.pivot = pivot;
            let resolved = state
                .anchor
                .resolve(state.basis, pivot, state.precision.number);
            (previous, resolved.offset)
        };
        let report = self.0.events.pivot_changed.invoke(&ValueChanged {
            node: self.clone(),
            previous,
            current: pivot,
        });
        log_faults(self, "pivot_changed", report);
        self.store_offset(offset);
    }

    /// Set the free-form position.
    pub fn set_local_pos(&self, pos: Vec3) {
        let previous = {
            let mut state = self.0.state.borrow_mut();
            let previous = state.local_pos;
            state.local_pos = pos;
            if previous.near_eq(pos, state.precision.position) {
                return;
            }
            previous
        };
        let report = self.0.events.local_pos_changed.invoke(&ValueChanged {
            node: self.clone(),
            previous,
            current: pos,
        });
        log_faults(self, "local_pos_changed", report);
    }

    /// Toggle parent-follow behaviour.
    pub fn set_auto_update(&self, auto_update: bool) {
        {
            let mut state = self.0.state.borrow_mut();
            if state.auto_update == auto_update {
                return;
            }
            state.auto_update = auto_update;
        }
        let report = self.0.events.auto_update_changed.invoke(&ValueChanged {
            node: self.clone(),
            previous: !auto_update,
            current: auto_update,
        });
        log_faults(self, "auto_update_changed", report);
    }

    /// Re-resolve the stored anchor parameters against the parent's
    /// current size.
    pub fn follow_parent(&self) {
        self.update_anchor_param(self.anchor_params());
    }

    fn store_offset(&self, offset: Vec3) {
        let previous = {
            let mut state = self.0.state.borrow_mut();
            let previous = state.offset;
            state.offset = offset;
            if previous.near_eq(offset, state.precision.position) {
                return;
            }
            previous
        };
        let report = self.0.events.offset_changed.invoke(&ValueChanged {
            node: self.clone(),
            previous,
            current: offset,
        });
        log_faults(self, "offset_changed", report);
    }

    /// Store new geometry, fire one event per changed field, then push a
    /// size change down to auto-updating children.
    fn commit(&self, params: AnchorParams, basis: Vec3, size: Vec3, offset: Vec3) {
        let (prev_anchor, prev_size, prev_offset, precision) = {
            let mut state = self.0.state.borrow_mut();
            let prev = (state.anchor, state.local_size, state.offset, state.precision);
            state.anchor = params;
            state.basis = basis;
            state.local_size = size;
            state.offset = offset;
            prev
        };

        let anchors_changed = !prev_anchor.min.near_eq(params.min, precision.number)
            || !prev_anchor.max.near_eq(params.max, precision.number);
        let offsets_changed = !prev_anchor
            .offset_min
            .near_eq(params.offset_min, precision.position)
            || !prev_anchor
                .offset_max
                .near_eq(params.offset_max, precision.position);
        let size_changed = !prev_size.near_eq(size, precision.position);
        let offset_changed = !prev_offset.near_eq(offset, precision.position);

        if anchors_changed {
            let report = self.0.events.anchor_changed.invoke(&ValueChanged {
                node: self.clone(),
                previous: (prev_anchor.min, prev_anchor.max),
                current: (params.min, params.max),
            });
            log_faults(self, "anchor_changed", report);
        }
        if offsets_changed {
            let report = self.0.events.anchor_offset_changed.invoke(&ValueChanged {
                node: self.clone(),
                previous: (prev_anchor.offset_min, prev_anchor.offset_max),
                current: (params.offset_min, params.offset_max),
            });
            log_faults(self, "anchor_offset_changed", report);
        }
        if size_changed {
            let report = self.0.events.local_size_changed.invoke(&ValueChanged {
                node: self.clone(),
                previous: prev_size,
                current: size,
            });
            log_faults(self, "local_size_changed", report);
        }
        if offset_changed {
            let report = self.0.events.offset_changed.invoke(&ValueChanged {
                node: self.clone(),
                previous: prev_offset,
                current: offset,
            });
            log_faults(self, "offset_changed", report);
        }

        if size_changed {
            self.propagate_to_children();
        }
    }

    fn propagate_to_children(&self) {
        for child in self.children() {
            if child.is_auto_update() {
                trace!(parent = %self, child = %child, "child follows parent resize");
                child.follow_parent();
            }
        }
    }

    // === Layout info ===

    /// Edit the constraints in place; fires a single event with the union of
    /// changed fields and re-resolves the size when a size field changed.
    pub fn update_layout_info<F>(&self, edit: F)
    where
        F: FnOnce(&mut LayoutInfo),
    {
        let mut next = self.layout_info();
        edit(&mut next);
        self.assign_layout_info(next);
    }

    /// Copy every field of `info` at once.
    pub fn assign_layout_info(&self, info: LayoutInfo) {
        let (previous, flags) = {
            let mut state = self.0.state.borrow_mut();
            let previous = state.info;
            let flags = previous.diff(&info);
            if flags.is_empty() {
                return;
            }
            state.info = info;
            (previous, flags)
        };
        debug!(node = %self, ?flags, "layout info changed");

        if flags.intersects(LayoutInfoFlags::SIZE) {
            self.reclamp();
        }
        let report = self.0.events.layout_info_changed.invoke(&LayoutInfoChanged {
            node: self.clone(),
            flags,
            previous,
        });
        log_faults(self, "layout_info_changed", report);
        // A changed layout size alters what children resolve against even
        // when this node's own size stays put.
        if flags.intersects(LayoutInfoFlags::SIZE) {
            self.propagate_to_children();
        }
    }

    /// Set the lower bound.
    pub fn set_min_size(&self, min: Vec3) {
        self.update_layout_info(|info| info.min_size = min);
    }

    /// Set the upper bound.
    pub fn set_max_size(&self, max: Vec3) {
        self.update_layout_info(|info| info.max_size = max);
    }

    /// Set both bounds in one change.
    pub fn set_min_max_size(&self, min: Vec3, max: Vec3) {
        self.update_layout_info(|info| {
            info.min_size = min;
            info.max_size = max;
        });
    }

    /// Set the size children see.
    pub fn set_layout_size(&self, size: Vec3) {
        self.update_layout_info(|info| info.layout_size = size);
    }

    /// Set the hints consumed by group layouts.
    pub fn set_layout_group_hints(&self, ignore: bool, grow: f32, order: i32) {
        self.update_layout_info(|info| {
            info.ignore_layout_group = ignore;
            info.size_grow_in_group = grow;
            info.order_in_group = order;
        });
    }

    /// Resolve the raw size from the stored parameters and run it through
    /// the current constraints, without touching children.
    fn reclamp(&self) {
        let (previous, size) = {
            let mut state = self.0.state.borrow_mut();
            let raw = state
                .anchor
                .resolve(state.basis, state.pivot, state.precision.number)
                .size;
            let size = state.info.clamp(raw);
            let previous = state.local_size;
            state.local_size = size;
            if previous.near_eq(size, state.precision.position) {
                return;
            }
            (previous, size)
        };
        let report = self.0.events.local_size_changed.invoke(&ValueChanged {
            node: self.clone(),
            previous,
            current: size,
        });
        log_faults(self, "local_size_changed", report);
    }

    // === Layout registry ===

    /// Attached layout operations, ascending by priority.
    pub fn layouts(&self) -> Vec<Layout> {
        self.0
            .state
            .borrow()
            .layouts
            .iter()
            .map(|a| a.layout.clone())
            .collect()
    }

    /// Number of attached layout operations.
    pub fn layout_count(&self) -> usize {
        self.0.state.borrow().layouts.len()
    }

    /// True when `layout` is attached to this node.
    pub fn has_layout(&self, layout: &Layout) -> bool {
        self.0
            .state
            .borrow()
            .layouts
            .iter()
            .any(|a| a.layout == *layout)
    }

    /// Attach a layout operation, keeping the list sorted by priority (ties
    /// keep insertion order). A layout attached elsewhere is moved here.
    ///
    /// Returns `false` for a disposed layout or one already attached here.
    pub fn add_layout(&self, layout: &Layout) -> bool {
        if layout.is_disposed() || self.has_layout(layout) {
            return false;
        }
        if let Some(previous) = layout.target() {
            previous.remove_layout(layout);
        }

        let weak = self.downgrade();
        let disposed_hook = layout.events().disposed.add(move |l: &Layout| {
            if let Some(node) = weak.upgrade() {
                node.remove_layout(l);
            }
        });
        let weak = self.downgrade();
        let priority_hook = layout.events().priority_changed.add(move |_| {
            if let Some(node) = weak.upgrade() {
                node.sort_layouts();
            }
        });

        {
            let mut state = self.0.state.borrow_mut();
            let seq = state.next_layout_seq;
            state.next_layout_seq += 1;
            state.layouts.push(AttachedLayout {
                layout: layout.clone(),
                seq,
                disposed_hook,
                priority_hook,
            });
        }
        layout.set_target(Some(self));
        self.sort_layouts();
        debug!(
            node = %self,
            layout = layout.name(),
            priority = layout.priority(),
            "attached layout"
        );

        let report = self.0.events.layout_added.invoke(&LayoutChanged {
            node: self.clone(),
            layout: layout.clone(),
        });
        log_faults(self, "layout_added", report);
        true
    }

    /// Detach a layout operation. Returns whether it was attached.
    pub fn remove_layout(&self, layout: &Layout) -> bool {
        let attached = {
            let mut state = self.0.state.borrow_mut();
            match state.layouts.iter().position(|a| a.layout == *layout) {
                Some(index) => state.layouts.remove(index),
                None => return false,
            }
        };
        layout.events().disposed.remove(attached.disposed_hook);
        layout.events().priority_changed.remove(attached.priority_hook);
        layout.set_target(None);
        debug!(node = %self, layout = layout.name(), "detached layout");

        let report = self.0.events.layout_removed.invoke(&LayoutChanged {
            node: self.clone(),
            layout: layout.clone(),
        });
        log_faults(self, "layout_removed", report);
        true
    }

    fn sort_layouts(&self) {
        self.0
            .state
            .borrow_mut()
            .layouts
            .sort_by_key(|a| (a.layout.priority(), a.seq));
    }
}

fn log_faults(node: &LayoutNode, event: &'static str, report: DispatchReport) {
    if report.has_faults() {
        debug!(
            node = %node,
            event,
            faulted = report.faulted,
            invoked = report.invoked,
            "listener faults discarded"
        );
    }
}
