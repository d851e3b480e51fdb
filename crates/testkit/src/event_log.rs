//! Records node notifications in the order they fire.

use std::cell::RefCell;
use std::rc::Rc;

use anchorkit_layout::{
    ChildChanged, Event, LayoutChanged, LayoutInfoChanged, LayoutNode, ParentChanged,
    ValueChanged, VecPair,
};
use glam::Vec3;

use crate::EventRecord;

#[derive(Default)]
struct Inner {
    next_seq: u64,
    records: Vec<EventRecord>,
}

/// Shared recorder attached to one or more nodes.
///
/// Clones share the same record list. The recorder holds no strong
/// reference to the nodes it listens to.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Rc<RefCell<Inner>>,
}

impl EventLog {
    /// Empty recorder, not attached to anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder attached to `node` only.
    pub fn attach(node: &LayoutNode) -> Self {
        let log = Self::new();
        log.listen(node);
        log
    }

    /// Recorder attached to `node` and every current descendant.
    pub fn attach_tree(node: &LayoutNode) -> Self {
        let log = Self::attach(node);
        for child in node.descendants() {
            log.listen(&child);
        }
        log
    }

    /// Start recording every event of `node`.
    pub fn listen(&self, node: &LayoutNode) {
        let events = node.events();
        self.hook(&events.parent_changed, "parent_changed", |e: &ParentChanged| {
            (
                e.node.to_string(),
                format!("{} -> {}", name_of(&e.old_parent), name_of(&e.new_parent)),
            )
        });
        self.hook(&events.child_added, "child_added", |e: &ChildChanged| {
            (e.parent.to_string(), e.child.to_string())
        });
        self.hook(&events.child_removed, "child_removed", |e: &ChildChanged| {
            (e.parent.to_string(), e.child.to_string())
        });
        self.hook(&events.local_size_changed, "local_size_changed", describe_vec);
        self.hook(&events.offset_changed, "offset_changed", describe_vec);
        self.hook(&events.pivot_changed, "pivot_changed", describe_vec);
        self.hook(&events.local_pos_changed, "local_pos_changed", describe_vec);
        self.hook(&events.anchor_changed, "anchor_changed", describe_pair);
        self.hook(&events.anchor_offset_changed, "anchor_offset_changed", describe_pair);
        self.hook(&events.layout_info_changed, "layout_info_changed", |e: &LayoutInfoChanged| {
            (e.node.to_string(), format!("{:?}", e.flags))
        });
        self.hook(&events.auto_update_changed, "auto_update_changed", |e: &ValueChanged<bool>| {
            (e.node.to_string(), format!("{} -> {}", e.previous, e.current))
        });
        self.hook(&events.layout_added, "layout_added", |e: &LayoutChanged| {
            (e.node.to_string(), e.layout.name().to_string())
        });
        self.hook(&events.layout_removed, "layout_removed", |e: &LayoutChanged| {
            (e.node.to_string(), e.layout.name().to_string())
        });
        self.hook(&events.disposed, "disposed", |n: &LayoutNode| (n.to_string(), String::new()));
    }

    fn hook<A, F>(&self, event: &Event<A>, kind: &'static str, describe: F)
    where
        A: 'static,
        F: Fn(&A) -> (String, String) + 'static,
    {
        let inner = Rc::downgrade(&self.inner);
        event.add(move |args: &A| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let (node, payload) = describe(args);
            let mut inner = inner.borrow_mut();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.records.push(EventRecord {
                seq,
                kind: kind.to_string(),
                node,
                payload,
            });
        });
    }

    /// Everything captured so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.inner.borrow().records.clone()
    }

    /// Event kinds in capture order.
    pub fn kinds(&self) -> Vec<String> {
        self.inner
            .borrow()
            .records
            .iter()
            .map(|r| r.kind.clone())
            .collect()
    }

    /// Number of captured events of one kind.
    pub fn count(&self, kind: &str) -> usize {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Total number of captured events.
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    /// Forget captured events; sequence numbers keep counting.
    pub fn clear(&self) {
        self.inner.borrow_mut().records.clear();
    }
}

fn name_of(node: &Option<LayoutNode>) -> String {
    node.as_ref()
        .map(LayoutNode::to_string)
        .unwrap_or_else(|| "none".to_string())
}

fn fmt_vec(v: Vec3) -> String {
    format!("[{},{},{}]", v.x, v.y, v.z)
}

fn describe_vec(e: &ValueChanged<Vec3>) -> (String, String) {
    (
        e.node.to_string(),
        format!("{} -> {}", fmt_vec(e.previous), fmt_vec(e.current)),
    )
}

fn describe_pair(e: &ValueChanged<VecPair>) -> (String, String) {
    (
        e.node.to_string(),
        format!(
            "({},{}) -> ({},{})",
            fmt_vec(e.previous.0),
            fmt_vec(e.previous.1),
            fmt_vec(e.current.0),
            fmt_vec(e.current.1)
        ),
    )
}
