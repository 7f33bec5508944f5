use std::cell::RefCell;
use std::rc::Rc;

use animgraph::{
    AnimGraphError, AnimatedEvent, AnimatedNodesManager, FrameTime, NodeTag, PropMap, ViewHost,
    ViewTag,
};
use serde_json::json;

#[derive(Clone, Default)]
struct RecordingHost {
    pushes: Rc<RefCell<Vec<(ViewTag, PropMap)>>>,
}

impl ViewHost for RecordingHost {
    fn update_view_props(&mut self, view: ViewTag, props: &PropMap) {
        self.pushes.borrow_mut().push((view, props.clone()));
    }
}

fn manager() -> (AnimatedNodesManager, Rc<RefCell<Vec<(ViewTag, PropMap)>>>) {
    let host = RecordingHost::default();
    let pushes = Rc::clone(&host.pushes);
    (AnimatedNodesManager::new(host), pushes)
}

fn value_node(m: &mut AnimatedNodesManager, tag: u64, value: f64) {
    m.create_animated_node(NodeTag(tag), &json!({ "type": "value", "value": value }))
        .unwrap();
}

#[test]
fn value_identity_survives_flatten_and_extract() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 3.0);
    m.set_animated_node_offset(NodeTag(1), 2.0).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 5.0);

    m.extract_animated_node_offset(NodeTag(1)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 5.0);

    m.flatten_animated_node_offset(NodeTag(1)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 5.0);
}

#[test]
fn combinators_recompute_from_fresh_parent_values() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 2.0);
    value_node(&mut m, 2, 3.0);
    m.create_animated_node(NodeTag(3), &json!({ "type": "addition", "input": [1, 2] }))
        .unwrap();
    m.create_animated_node(NodeTag(4), &json!({ "type": "multiplication", "input": [3, 2] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(3)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(3)).unwrap();
    m.connect_animated_nodes(NodeTag(3), NodeTag(4)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(4)).unwrap();

    m.run_updates(FrameTime::from_millis(0.0)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(3)).unwrap(), 5.0);
    // The product sees the freshly summed value, not a stale one.
    assert_eq!(m.animated_node_value(NodeTag(4)).unwrap(), 15.0);

    m.set_animated_node_value(NodeTag(1), 7.0).unwrap();
    m.run_updates(FrameTime::from_millis(16.0)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(3)).unwrap(), 10.0);
    assert_eq!(m.animated_node_value(NodeTag(4)).unwrap(), 30.0);
}

#[test]
fn dependents_update_strictly_after_their_sources() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 1.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "addition", "input": [1] }))
        .unwrap();
    m.create_animated_node(NodeTag(3), &json!({ "type": "addition", "input": [2] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(3)).unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in [2u64, 3] {
        let order = Rc::clone(&order);
        m.start_listening_to_animated_node_value(
            NodeTag(tag),
            Box::new(move |_| order.borrow_mut().push(tag)),
        )
        .unwrap();
    }

    m.set_animated_node_value(NodeTag(1), 4.0).unwrap();
    m.run_updates(FrameTime::from_millis(0.0)).unwrap();

    assert_eq!(*order.borrow(), vec![2, 3]);
    assert_eq!(m.animated_node_value(NodeTag(3)).unwrap(), 4.0);
}

#[test]
fn division_by_zero_fails_and_leaves_the_node_untouched() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 10.0);
    value_node(&mut m, 2, 0.0);
    m.create_animated_node(NodeTag(3), &json!({ "type": "division", "input": [1, 2] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(3)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(3)).unwrap();

    let err = m.run_updates(FrameTime::from_millis(0.0)).unwrap_err();
    assert!(matches!(err, AnimGraphError::Arithmetic(_)));
    assert_eq!(m.animated_node_value(NodeTag(3)).unwrap(), 0.0);
}

#[test]
fn diffclamp_follows_deltas_within_the_band() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.create_animated_node(
        NodeTag(2),
        &json!({ "type": "diffclamp", "input": 1, "min": 0.0, "max": 10.0 }),
    )
    .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.set_animated_node_value(NodeTag(2), 5.0).unwrap();

    let mut observed = Vec::new();
    for (i, input) in [0.0, 3.0, 3.0, 20.0].into_iter().enumerate() {
        m.set_animated_node_value(NodeTag(1), input).unwrap();
        m.run_updates(FrameTime::from_millis(i as f64 * 16.0)).unwrap();
        observed.push(m.animated_node_value(NodeTag(2)).unwrap());
    }
    assert_eq!(observed, vec![5.0, 8.0, 8.0, 10.0]);
}

#[test]
fn cycles_in_the_active_subgraph_are_fatal() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    value_node(&mut m, 2, 0.0);
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(1)).unwrap();
    m.set_animated_node_value(NodeTag(1), 1.0).unwrap();

    let err = m.run_updates(FrameTime::from_millis(0.0)).unwrap_err();
    assert!(matches!(err, AnimGraphError::Cycle(_)));
}

#[test]
fn interpolation_projects_its_parent_value() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.create_animated_node(
        NodeTag(2),
        &json!({
            "type": "interpolation",
            "inputRange": [0.0, 1.0],
            "outputRange": [0.0, 180.0],
            "extrapolateLeft": "clamp",
            "extrapolateRight": "clamp",
        }),
    )
    .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();

    m.set_animated_node_value(NodeTag(1), 0.5).unwrap();
    m.run_updates(FrameTime::from_millis(0.0)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(2)).unwrap(), 90.0);

    m.set_animated_node_value(NodeTag(1), 4.0).unwrap();
    m.run_updates(FrameTime::from_millis(16.0)).unwrap();
    assert_eq!(m.animated_node_value(NodeTag(2)).unwrap(), 180.0);
}

#[test]
fn props_nodes_push_merged_maps_to_the_view_layer() {
    let (mut m, pushes) = manager();
    value_node(&mut m, 1, 0.5);
    m.create_animated_node(
        NodeTag(2),
        &json!({
            "type": "transform",
            "transforms": [
                { "type": "animated", "property": "rotate", "nodeTag": 1 },
                { "type": "static", "property": "scale", "value": 2.0 },
            ],
        }),
    )
    .unwrap();
    m.create_animated_node(NodeTag(3), &json!({ "type": "style", "style": { "transform": 2, "opacity": 1 } }))
        .unwrap();
    m.create_animated_node(NodeTag(4), &json!({ "type": "props", "props": { "style": 3 } }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.connect_animated_nodes(NodeTag(2), NodeTag(3)).unwrap();
    m.connect_animated_nodes(NodeTag(3), NodeTag(4)).unwrap();
    m.connect_animated_node_to_view(NodeTag(4), ViewTag(42)).unwrap();

    m.run_updates(FrameTime::from_millis(0.0)).unwrap();

    let pushes = pushes.borrow();
    let (view, props) = pushes.last().expect("expected a prop push");
    assert_eq!(*view, ViewTag(42));
    assert_eq!(props["opacity"], json!(0.5));
    assert_eq!(props["transform"], json!([{ "rotate": 0.5 }, { "scale": 2.0 }]));
}

#[test]
fn restore_default_values_pushes_nulls_for_controlled_props() {
    let (mut m, pushes) = manager();
    value_node(&mut m, 1, 1.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "props", "props": { "opacity": 1 } }))
        .unwrap();

    m.restore_default_values(NodeTag(2), ViewTag(9)).unwrap();
    let pushes = pushes.borrow();
    let (view, props) = pushes.last().expect("expected a prop push");
    assert_eq!(*view, ViewTag(9));
    assert_eq!(props["opacity"], serde_json::Value::Null);
}

#[test]
fn drop_and_restore_tolerate_unknown_tags() {
    let (mut m, pushes) = manager();
    m.drop_animated_node(NodeTag(99));
    m.restore_default_values(NodeTag(99), ViewTag(1)).unwrap();
    assert!(pushes.borrow().is_empty());
}

#[test]
fn dangling_edges_surface_when_traversed() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "addition", "input": [1] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.drop_animated_node(NodeTag(2));

    m.set_animated_node_value(NodeTag(1), 1.0).unwrap();
    let err = m.run_updates(FrameTime::from_millis(0.0)).unwrap_err();
    assert!(matches!(err, AnimGraphError::Config(_)));
}

#[test]
fn events_update_bound_nodes_and_dependents_immediately() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "addition", "input": [1] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.run_updates(FrameTime::from_millis(0.0)).unwrap();

    m.add_animated_event_to_view(
        ViewTag(7),
        "topScroll",
        &json!({ "animatedValueTag": 1, "nativeEventPath": ["contentOffset", "y"] }),
    )
    .unwrap();

    m.on_event_dispatch(AnimatedEvent {
        view_tag: ViewTag(7),
        event_name: "topScroll".to_string(),
        payload: json!({ "contentOffset": { "y": 12.5 } }),
    })
    .unwrap();

    // No run_updates in between: the event pass already propagated.
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 12.5);
    assert_eq!(m.animated_node_value(NodeTag(2)).unwrap(), 12.5);
}

#[test]
fn removed_event_bindings_stop_reacting() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.add_animated_event_to_view(
        ViewTag(7),
        "topScroll",
        &json!({ "animatedValueTag": 1, "nativeEventPath": ["y"] }),
    )
    .unwrap();
    m.remove_animated_event_from_view(ViewTag(7), "topScroll", NodeTag(1));

    m.on_event_dispatch(AnimatedEvent {
        view_tag: ViewTag(7),
        event_name: "topScroll".to_string(),
        payload: json!({ "y": 3.0 }),
    })
    .unwrap();
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 0.0);
}

#[test]
fn off_thread_events_arrive_through_the_handle() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 0.0);
    m.add_animated_event_to_view(
        ViewTag(3),
        "topPan",
        &json!({ "animatedValueTag": 1, "nativeEventPath": ["dx"] }),
    )
    .unwrap();

    let handle = m.event_handle();
    let producer = std::thread::spawn(move || {
        handle.dispatch(AnimatedEvent {
            view_tag: ViewTag(3),
            event_name: "topPan".to_string(),
            payload: json!({ "dx": 8.0 }),
        });
    });
    producer.join().unwrap();

    // Nothing applied until the dispatcher thread drains the queue.
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 0.0);
    m.pump_events().unwrap();
    assert_eq!(m.animated_node_value(NodeTag(1)).unwrap(), 8.0);
}

#[test]
fn listeners_fire_only_on_change_and_can_be_stopped() {
    let (mut m, _) = manager();
    value_node(&mut m, 1, 1.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "addition", "input": [1] }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    m.start_listening_to_animated_node_value(NodeTag(2), Box::new(move |v| sink.borrow_mut().push(v)))
        .unwrap();

    m.run_updates(FrameTime::from_millis(0.0)).unwrap();
    // Same value again: dirty pass runs, listener stays quiet.
    m.set_animated_node_value(NodeTag(1), 1.0).unwrap();
    m.run_updates(FrameTime::from_millis(16.0)).unwrap();
    m.set_animated_node_value(NodeTag(1), 2.0).unwrap();
    m.run_updates(FrameTime::from_millis(32.0)).unwrap();
    assert_eq!(*seen.borrow(), vec![1.0, 2.0]);

    m.stop_listening_to_animated_node_value(NodeTag(2)).unwrap();
    m.set_animated_node_value(NodeTag(1), 3.0).unwrap();
    m.run_updates(FrameTime::from_millis(48.0)).unwrap();
    assert_eq!(*seen.borrow(), vec![1.0, 2.0]);
}

#[test]
fn disconnecting_from_a_view_stops_prop_pushes() {
    let (mut m, pushes) = manager();
    value_node(&mut m, 1, 1.0);
    m.create_animated_node(NodeTag(2), &json!({ "type": "props", "props": { "opacity": 1 } }))
        .unwrap();
    m.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
    m.connect_animated_node_to_view(NodeTag(2), ViewTag(5)).unwrap();
    m.run_updates(FrameTime::from_millis(0.0)).unwrap();
    assert_eq!(pushes.borrow().len(), 1);

    m.disconnect_animated_node_from_view(NodeTag(2), ViewTag(5)).unwrap();
    m.set_animated_node_value(NodeTag(1), 0.5).unwrap();
    m.run_updates(FrameTime::from_millis(16.0)).unwrap();
    assert_eq!(pushes.borrow().len(), 1);
}
