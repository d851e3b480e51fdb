//! Pluggable layout operations attached to a node.
//!
//! A node keeps its [`Layout`]s sorted by priority and drops them when they
//! are disposed. Running them is left to whoever schedules layout passes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use anchorkit_events::Event;
use tracing::debug;

use crate::node::{LayoutNode, WeakLayoutNode};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Attributes a layout operation may write.
    pub struct LayoutCapabilities: u8 {
        const POS_X = 0b0000_0001;
        const POS_Y = 0b0000_0010;
        const POS_Z = 0b0000_0100;
        const SIZE_X = 0b0000_1000;
        const SIZE_Y = 0b0001_0000;
        const SIZE_Z = 0b0010_0000;
        const PIVOT = 0b0100_0000;
        const POS = Self::POS_X.bits() | Self::POS_Y.bits() | Self::POS_Z.bits();
        const SIZE = Self::SIZE_X.bits() | Self::SIZE_Y.bits() | Self::SIZE_Z.bits();
    }
}

/// Behaviour of a layout operation.
pub trait LayoutOperation {
    /// Short label for logs and snapshots.
    fn name(&self) -> &str {
        "layout"
    }

    /// Attributes this operation writes.
    fn capabilities(&self) -> LayoutCapabilities;

    /// Apply the layout to `target` and its children.
    fn update_layout(&mut self, target: &LayoutNode);

    /// Whether `target` is already laid out the way this operation wants.
    fn validate(&self, target: &LayoutNode) -> bool;
}

/// Arguments of [`LayoutEvents::priority_changed`].
#[derive(Debug, Clone)]
pub struct PriorityChanged {
    /// Layout whose priority changed.
    pub layout: Layout,
    /// Priority before the change.
    pub previous: i32,
    /// Priority after the change.
    pub current: i32,
}

/// Notifications emitted by a [`Layout`].
#[derive(Debug, Default)]
pub struct LayoutEvents {
    /// Priority changed.
    pub priority_changed: Event<PriorityChanged>,
    /// The layout was disposed. Fires once.
    pub disposed: Event<Layout>,
}

struct LayoutInner {
    priority: Cell<i32>,
    disposed: Cell<bool>,
    name: String,
    capabilities: Cell<LayoutCapabilities>,
    operation: RefCell<Box<dyn LayoutOperation>>,
    target: RefCell<WeakLayoutNode>,
    events: LayoutEvents,
}

/// Shared handle to a layout operation. Equality is identity.
#[derive(Clone)]
pub struct Layout(Rc<LayoutInner>);

impl PartialEq for Layout {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Layout {}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("name", &self.0.name)
            .field("priority", &self.0.priority.get())
            .field("disposed", &self.0.disposed.get())
            .finish()
    }
}

impl Layout {
    /// Wrap an operation with the given priority.
    pub fn new<O>(priority: i32, operation: O) -> Self
    where
        O: LayoutOperation + 'static,
    {
        let name = operation.name().to_string();
        let capabilities = operation.capabilities();
        Self(Rc::new(LayoutInner {
            priority: Cell::new(priority),
            disposed: Cell::new(false),
            name,
            capabilities: Cell::new(capabilities),
            operation: RefCell::new(Box::new(operation)),
            target: RefCell::new(WeakLayoutNode::default()),
            events: LayoutEvents::default(),
        }))
    }

    /// Label taken from the operation.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Ordering key; lower runs first.
    pub fn priority(&self) -> i32 {
        self.0.priority.get()
    }

    /// Change the priority and notify listeners (the owning node re-sorts).
    pub fn set_priority(&self, priority: i32) {
        let previous = self.0.priority.replace(priority);
        if previous == priority {
            return;
        }
        self.0.events.priority_changed.invoke(&PriorityChanged {
            layout: self.clone(),
            previous,
            current: priority,
        });
    }

    /// Attributes the operation writes. While the operation is running,
    /// the last answer it gave is returned.
    pub fn capabilities(&self) -> LayoutCapabilities {
        match self.0.operation.try_borrow() {
            Ok(operation) => {
                let capabilities = operation.capabilities();
                self.0.capabilities.set(capabilities);
                capabilities
            }
            Err(_) => self.0.capabilities.get(),
        }
    }

    /// Notification points.
    pub fn events(&self) -> &LayoutEvents {
        &self.0.events
    }

    /// Node this layout is attached to.
    pub fn target(&self) -> Option<LayoutNode> {
        self.0.target.borrow().upgrade()
    }

    pub(crate) fn set_target(&self, target: Option<&LayoutNode>) {
        *self.0.target.borrow_mut() = target.map(LayoutNode::downgrade).unwrap_or_default();
    }

    /// Run the operation against its target. Does nothing when detached,
    /// disposed, or already running.
    pub fn update_layout(&self) {
        if self.is_disposed() {
            return;
        }
        let Some(target) = self.target() else {
            return;
        };
        match self.0.operation.try_borrow_mut() {
            Ok(mut operation) => operation.update_layout(&target),
            Err(_) => debug!(layout = %self.0.name, "skipping re-entrant layout update"),
        }
    }

    /// Ask the operation whether its target is up to date. A detached
    /// layout, or one that is still running, is never valid.
    pub fn validate(&self) -> bool {
        let Some(target) = self.target() else {
            return false;
        };
        match self.0.operation.try_borrow() {
            Ok(operation) => operation.validate(&target),
            Err(_) => {
                debug!(layout = %self.0.name, "validate called during layout update");
                false
            }
        }
    }

    /// Whether [`Layout::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    /// Fire `disposed` once (detaching from the owning node) and drop every
    /// listener.
    pub fn dispose(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        self.0.events.disposed.invoke(self);
        self.0.events.priority_changed.close();
        self.0.events.disposed.close();
        self.set_target(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::rc::Rc;

    struct Counter {
        runs: Rc<Cell<u32>>,
    }

    impl LayoutOperation for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn capabilities(&self) -> LayoutCapabilities {
            LayoutCapabilities::SIZE_X | LayoutCapabilities::POS_X
        }

        fn update_layout(&mut self, _target: &LayoutNode) {
            self.runs.set(self.runs.get() + 1);
        }

        fn validate(&self, _target: &LayoutNode) -> bool {
            self.runs.get() > 0
        }
    }

    fn counter(priority: i32) -> (Layout, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let layout = Layout::new(
            priority,
            Counter {
                runs: Rc::clone(&runs),
            },
        );
        (layout, runs)
    }

    fn priorities(node: &LayoutNode) -> Vec<i32> {
        node.layouts().iter().map(Layout::priority).collect()
    }

    #[test]
    fn layouts_sorted_by_priority_with_stable_ties() {
        let node = LayoutNode::new();
        let (a, _) = counter(5);
        let (b, _) = counter(1);
        let (c, _) = counter(5);
        let (d, _) = counter(3);
        for layout in [&a, &b, &c, &d] {
            assert!(node.add_layout(layout));
        }
        assert_eq!(node.layouts(), vec![b.clone(), d.clone(), a.clone(), c.clone()]);
        assert_eq!(a.target(), Some(node.clone()));
    }

    #[test]
    fn priority_change_resorts() {
        let node = LayoutNode::new();
        let (a, _) = counter(1);
        let (b, _) = counter(2);
        node.add_layout(&a);
        node.add_layout(&b);
        a.set_priority(10);
        assert_eq!(node.layouts(), vec![b, a]);
        assert_eq!(priorities(&node), vec![2, 10]);
    }

    #[test]
    fn dispose_removes_from_node() {
        let node = LayoutNode::new();
        let (a, _) = counter(1);
        node.add_layout(&a);
        a.dispose();
        assert_eq!(node.layout_count(), 0);
        assert!(a.target().is_none());
        assert!(!node.add_layout(&a));
    }

    #[test]
    fn remove_unhooks_and_clears_target() {
        let node = LayoutNode::new();
        let (a, _) = counter(1);
        node.add_layout(&a);
        assert_eq!(a.events().disposed.len(), 1);
        assert!(node.remove_layout(&a));
        assert!(!node.remove_layout(&a));
        assert!(a.events().disposed.is_empty());
        assert!(a.events().priority_changed.is_empty());
        assert!(a.target().is_none());
    }

    #[test]
    fn adding_elsewhere_moves_layout() {
        let first = LayoutNode::new();
        let second = LayoutNode::new();
        let (a, _) = counter(1);
        first.add_layout(&a);
        second.add_layout(&a);
        assert_eq!(first.layout_count(), 0);
        assert_eq!(second.layouts(), vec![a.clone()]);
        assert_eq!(a.events().disposed.len(), 1);
    }

    #[test]
    fn update_and_validate_need_a_target() {
        let (a, runs) = counter(0);
        a.update_layout();
        assert_eq!(runs.get(), 0);
        assert!(!a.validate());

        let node = LayoutNode::new();
        node.add_layout(&a);
        assert!(!a.validate());
        a.update_layout();
        assert_eq!(runs.get(), 1);
        assert!(a.validate());
        assert_eq!(a.capabilities(), LayoutCapabilities::SIZE_X | LayoutCapabilities::POS_X);
    }

    /// Resizes its target; listeners on the target see the layout mid-run.
    struct Resizer;

    impl LayoutOperation for Resizer {
        fn capabilities(&self) -> LayoutCapabilities {
            LayoutCapabilities::SIZE
        }

        fn update_layout(&mut self, target: &LayoutNode) {
            target.set_local_size(Vec3::splat(7.0));
        }

        fn validate(&self, target: &LayoutNode) -> bool {
            target.local_size() == Vec3::splat(7.0)
        }
    }

    #[test]
    fn listeners_may_query_a_running_layout() {
        let node = LayoutNode::new();
        let layout = Layout::new(0, Resizer);
        node.add_layout(&layout);

        let seen: Rc<Cell<Option<(LayoutCapabilities, bool)>>> = Rc::new(Cell::new(None));
        let (slot, running) = (Rc::clone(&seen), layout.clone());
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        node.events().local_size_changed.add(move |_| {
            slot.set(Some((running.capabilities(), running.validate())));
            counted.set(counted.get() + 1);
        });

        layout.update_layout();
        assert_eq!(node.local_size(), Vec3::splat(7.0));
        assert_eq!(calls.get(), 1);
        assert_eq!(seen.get(), Some((LayoutCapabilities::SIZE, false)));
        assert!(layout.validate());
        node.events().local_size_changed.clear();
    }
}
