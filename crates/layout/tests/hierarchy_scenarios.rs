//! End-to-end scenarios: parent-resize propagation, event suppression,
//! disposal and listener fault isolation.

use std::cell::Cell;
use std::rc::Rc;

use anchorkit_layout::{
    AnchorParams, Axis, Layout, LayoutInfoFlags, LayoutNode, NodeSnapshot, StackLayout,
    ValueChanged, UNFIXED,
};
use anchorkit_testkit::{canonical_json, EventLog};
use glam::Vec3;

fn stretched_child(parent: &LayoutNode, name: &str, inset: f32) -> LayoutNode {
    let child = LayoutNode::named(name);
    child.set_parent(Some(parent)).unwrap();
    child.update_anchor_param(
        AnchorParams::stretch().with_offsets(Vec3::splat(inset), Vec3::splat(inset)),
    );
    child
}

#[test]
fn parent_resize_propagates_to_auto_updating_children() {
    let parent = LayoutNode::named("parent");
    parent.set_local_size(Vec3::splat(100.0));
    let child = stretched_child(&parent, "child", 10.0);
    assert_eq!(child.local_size(), Vec3::splat(120.0));

    parent.set_local_size(Vec3::splat(20.0));
    assert_eq!(child.local_size(), Vec3::splat(40.0));
    assert_eq!(child.anchor_min_max(), (Vec3::ZERO, Vec3::ONE));
    assert_eq!(
        child.anchor_offset_min_max(),
        (Vec3::splat(10.0), Vec3::splat(10.0))
    );
}

#[test]
fn frozen_children_wait_for_follow_parent() {
    let parent = LayoutNode::named("parent");
    parent.set_local_size(Vec3::splat(100.0));
    let child = stretched_child(&parent, "child", 10.0);
    child.set_auto_update(false);

    parent.set_local_size(Vec3::splat(20.0));
    assert_eq!(child.local_size(), Vec3::splat(120.0));

    child.follow_parent();
    assert_eq!(child.local_size(), Vec3::splat(40.0));
}

#[test]
fn propagation_reaches_grandchildren() {
    let root = LayoutNode::named("root");
    root.set_local_size(Vec3::splat(100.0));
    let mid = stretched_child(&root, "mid", -10.0);
    let leaf = stretched_child(&mid, "leaf", -5.0);
    assert_eq!(mid.local_size(), Vec3::splat(80.0));
    assert_eq!(leaf.local_size(), Vec3::splat(70.0));

    root.set_local_size(Vec3::splat(60.0));
    assert_eq!(mid.local_size(), Vec3::splat(40.0));
    assert_eq!(leaf.local_size(), Vec3::splat(30.0));
}

#[test]
fn parent_layout_size_overrides_what_children_see() {
    let parent = LayoutNode::named("parent");
    parent.set_local_size(Vec3::splat(100.0));
    let child = stretched_child(&parent, "child", 0.0);

    parent.set_layout_size(Vec3::new(50.0, UNFIXED, UNFIXED));
    assert_eq!(parent.local_size(), Vec3::splat(100.0));
    assert_eq!(child.local_size(), Vec3::new(50.0, 100.0, 100.0));

    parent.set_min_size(Vec3::new(70.0, UNFIXED, UNFIXED));
    assert_eq!(child.local_size().x, 70.0);
}

#[test]
fn identical_update_anchor_param_is_silent() {
    let parent = LayoutNode::named("parent");
    parent.set_local_size(Vec3::splat(100.0));
    let child = LayoutNode::named("child");
    child.set_parent(Some(&parent)).unwrap();

    let params = AnchorParams::new(
        Vec3::new(0.0, 0.2, 0.5),
        Vec3::new(1.0, 0.8, 0.5),
        Vec3::splat(3.0),
        Vec3::splat(7.0),
    );
    child.update_anchor_param(params);

    let log = EventLog::attach(&child);
    child.update_anchor_param(params);
    assert_eq!(log.count("local_size_changed"), 0);
    assert_eq!(log.count("offset_changed"), 0);
    assert!(log.is_empty());
}

#[test]
fn forward_update_reports_each_changed_field_once() {
    let parent = LayoutNode::named("parent");
    parent.set_local_size(Vec3::splat(100.0));
    let child = LayoutNode::named("child");
    child.set_parent(Some(&parent)).unwrap();

    let log = EventLog::attach(&child);
    child.update_anchor_param(AnchorParams::stretch().with_offsets(Vec3::ZERO, Vec3::splat(10.0)));
    assert_eq!(
        log.kinds(),
        vec![
            "anchor_changed",
            "anchor_offset_changed",
            "local_size_changed",
            "offset_changed"
        ]
    );
    let size_event = &log.records()[2];
    assert_eq!(size_event.payload, "[0,0,0] -> [110,110,110]");
}

#[test]
fn dispose_cascades_once() {
    let parent = LayoutNode::named("parent");
    let node = LayoutNode::named("node");
    let kid_a = LayoutNode::named("a");
    let kid_b = LayoutNode::named("b");
    node.set_parent(Some(&parent)).unwrap();
    kid_a.set_parent(Some(&node)).unwrap();
    kid_b.set_parent(Some(&node)).unwrap();

    let disposed = Rc::new(Cell::new(0));
    let d = Rc::clone(&disposed);
    node.events().disposed.add(move |_| d.set(d.get() + 1));
    let parent_log = EventLog::attach(&parent);
    let kid_log = EventLog::attach(&kid_a);

    node.dispose();
    assert!(node.is_disposed());
    assert!(!parent.children().contains(&node));
    assert!(node.parent().is_none());
    assert!(kid_a.parent().is_none());
    assert!(kid_b.parent().is_none());
    assert_eq!(node.child_count(), 0);
    assert_eq!(disposed.get(), 1);
    assert_eq!(parent_log.kinds(), vec!["child_removed"]);
    assert!(kid_log.is_empty(), "children are orphaned without notifications");

    node.dispose();
    assert_eq!(disposed.get(), 1);
    assert!(node.events().disposed.is_empty());
}

#[test]
fn faulty_listener_does_not_block_mutation_or_peers() {
    let node = LayoutNode::named("node");
    let seen = Rc::new(Cell::new(Vec3::ZERO));
    node.events()
        .local_size_changed
        .add(|_: &ValueChanged<Vec3>| panic!("observer bug"));
    let s = Rc::clone(&seen);
    node.events()
        .local_size_changed
        .add(move |e: &ValueChanged<Vec3>| s.set(e.current));

    node.set_local_size(Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(node.local_size(), Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(seen.get(), Vec3::new(4.0, 5.0, 6.0));
}

#[test]
fn faulty_parent_listener_still_links_nodes() {
    let parent = LayoutNode::named("parent");
    let child = LayoutNode::named("child");
    parent.events().child_added.add(|_| panic!("observer bug"));
    child.events().parent_changed.add(|_| panic!("observer bug"));

    child.set_parent(Some(&parent)).unwrap();
    assert_eq!(child.parent(), Some(parent.clone()));
    assert_eq!(parent.child_count(), 1);
}

#[test]
fn listener_may_mutate_the_emitting_node() {
    let node = LayoutNode::named("node");
    let weak = node.downgrade();
    node.events().local_size_changed.add(move |e: &ValueChanged<Vec3>| {
        if let Some(node) = weak.upgrade() {
            node.set_local_pos(e.current * 0.5);
        }
    });
    node.set_local_size(Vec3::splat(8.0));
    assert_eq!(node.local_pos(), Vec3::splat(4.0));
}

#[test]
fn layout_info_assign_reports_union() {
    let node = LayoutNode::named("node");
    let log = EventLog::attach(&node);
    let mut info = node.layout_info();
    info.min_size = Vec3::splat(5.0);
    info.layout_size = Vec3::splat(9.0);
    info.order_in_group = 2;
    node.assign_layout_info(info);

    assert_eq!(log.count("layout_info_changed"), 1);
    let record = log
        .records()
        .into_iter()
        .find(|r| r.kind == "layout_info_changed")
        .unwrap();
    let expected =
        LayoutInfoFlags::MIN_SIZE | LayoutInfoFlags::LAYOUT_SIZE | LayoutInfoFlags::ORDER_IN_GROUP;
    assert_eq!(record.payload, format!("{:?}", expected));
    assert_eq!(node.local_size(), Vec3::splat(5.0));
}

#[test]
fn stack_layout_follows_registry_lifecycle() {
    let row = LayoutNode::named("row");
    row.set_local_size(Vec3::new(90.0, 10.0, 0.0));
    let cells: Vec<LayoutNode> = (0..3)
        .map(|i| {
            let cell = LayoutNode::named(format!("cell{i}"));
            cell.set_parent(Some(&row)).unwrap();
            cell.set_local_size(Vec3::new(10.0, 10.0, 0.0));
            cell.set_layout_group_hints(false, 1.0, 0);
            cell
        })
        .collect();

    let stack = Layout::new(10, StackLayout::along(Axis::X));
    let log = EventLog::attach(&row);
    row.add_layout(&stack);
    stack.update_layout();
    for cell in &cells {
        assert_eq!(cell.local_size().x, 30.0);
    }
    assert_eq!(cells[0].offset().x, -30.0);
    assert_eq!(cells[2].offset().x, 30.0);
    assert!(stack.validate());

    stack.dispose();
    assert_eq!(row.layout_count(), 0);
    assert_eq!(log.kinds(), vec!["layout_added", "layout_removed"]);
}

#[test]
fn snapshot_json_is_canonical() {
    let root = LayoutNode::named("root");
    root.set_local_size(Vec3::splat(100.0));
    stretched_child(&root, "child", 10.0);

    let json = canonical_json(&NodeSnapshot::capture(&root)).unwrap();
    assert!(json.contains("\"name\": \"child\""));
    assert!(json.contains("120.0"));
    let auto_update = json.find("\"auto_update\"").unwrap();
    let children = json.find("\"children\"").unwrap();
    assert!(auto_update < children, "keys are sorted");
}
