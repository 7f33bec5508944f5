use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use crate::{
    config::{AnimationConfig, EventMapping, NodeConfig, TransformSpec},
    core::{AnimationId, FrameTime, NodeTag, ViewTag},
    driver::{AnimationDriver, EndCallback},
    error::{AnimGraphError, AnimGraphResult},
    event::{AnimatedEvent, EventAnimationDriver, EventHandle},
    host::{PropMap, ViewHost},
    interpolate::interpolate,
    node::{AnimatedNode, NEVER_COLORED, NodeKind, ValueListener},
};

/// Maps raw host event names to the names events were registered under.
pub type EventNameResolver = Box<dyn Fn(&str) -> String>;

/// Owner of the animated node graph and coordinator of its per-frame
/// evaluation.
///
/// Every animation frame visits the nodes whose value may have changed (the
/// dirty set plus active animation targets) and their transitive children.
/// Terminal props nodes push computed prop maps to the [`ViewHost`].
///
/// The manager is single-threaded: all graph mutation and evaluation must
/// happen on the thread it was created on. Events produced elsewhere travel
/// through the channel behind [`event_handle`](Self::event_handle) and are
/// applied when the dispatcher thread drains them.
pub struct AnimatedNodesManager {
    nodes: BTreeMap<NodeTag, AnimatedNode>,
    active_animations: BTreeMap<AnimationId, AnimationDriver>,
    updated_nodes: BTreeSet<NodeTag>,
    event_drivers: BTreeMap<(ViewTag, String), Vec<EventAnimationDriver>>,
    host: Box<dyn ViewHost>,
    event_name_resolver: Option<EventNameResolver>,
    /// Generation counter for BFS visitation marks. Incremented per pass so
    /// per-node state never needs an O(n) reset; 0 stays reserved for nodes
    /// that were never visited.
    bfs_color: u32,
    dispatcher_thread: ThreadId,
    events_tx: mpsc::Sender<AnimatedEvent>,
    events_rx: mpsc::Receiver<AnimatedEvent>,
}

impl AnimatedNodesManager {
    pub fn new(host: impl ViewHost + 'static) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            nodes: BTreeMap::new(),
            active_animations: BTreeMap::new(),
            updated_nodes: BTreeSet::new(),
            event_drivers: BTreeMap::new(),
            host: Box::new(host),
            event_name_resolver: None,
            bfs_color: NEVER_COLORED,
            dispatcher_thread: thread::current().id(),
            events_tx,
            events_rx,
        }
    }

    /// Installs a custom event-name resolver applied before event-driver
    /// lookup (hosts often alias event names). Identity when unset.
    pub fn set_event_name_resolver(&mut self, resolver: impl Fn(&str) -> String + 'static) {
        self.event_name_resolver = Some(Box::new(resolver));
    }

    /// True while animations are in flight or nodes await an update pass.
    /// Hosts use this to keep their frame callback alive.
    pub fn has_active_animations(&self) -> bool {
        !self.active_animations.is_empty() || !self.updated_nodes.is_empty()
    }

    pub fn create_animated_node(
        &mut self,
        tag: NodeTag,
        config: &serde_json::Value,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        if self.nodes.contains_key(&tag) {
            return Err(AnimGraphError::config(format!(
                "animated node with tag '{}' already exists",
                tag.0
            )));
        }
        let config = NodeConfig::from_value(config)?;
        self.nodes.insert(tag, AnimatedNode::from_config(tag, config));
        self.updated_nodes.insert(tag);
        Ok(())
    }

    /// Removes the node from the registry and the dirty set. Idempotent:
    /// dropping an unknown tag is a designed no-op. Edges referring to the
    /// dropped tag become a caller error surfaced when next traversed.
    pub fn drop_animated_node(&mut self, tag: NodeTag) {
        self.assert_dispatcher();
        self.nodes.remove(&tag);
        self.updated_nodes.remove(&tag);
    }

    pub fn connect_animated_nodes(
        &mut self,
        parent: NodeTag,
        child: NodeTag,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.require_node(parent)?;
        self.node_mut(child)?.on_attached_to(parent)?;
        self.node_mut(parent)?.add_child(child);
        self.updated_nodes.insert(child);
        Ok(())
    }

    pub fn disconnect_animated_nodes(
        &mut self,
        parent: NodeTag,
        child: NodeTag,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.require_node(parent)?;
        self.require_node(child)?;
        self.node_mut(parent)?.remove_child(child);
        self.node_mut(child)?.on_detached_from(parent);
        self.updated_nodes.insert(child);
        Ok(())
    }

    pub fn connect_animated_node_to_view(
        &mut self,
        tag: NodeTag,
        view: ViewTag,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        let node = self.node_mut(tag)?;
        let kind = node.kind_name();
        match &mut node.kind {
            NodeKind::Props { connected_view, .. } => {
                if connected_view.is_some() {
                    return Err(AnimGraphError::config(format!(
                        "animated node with tag '{}' is already connected to a view",
                        tag.0
                    )));
                }
                *connected_view = Some(view);
            }
            _ => return Err(wrong_kind(tag, kind, "props")),
        }
        self.updated_nodes.insert(tag);
        Ok(())
    }

    pub fn disconnect_animated_node_from_view(
        &mut self,
        tag: NodeTag,
        view: ViewTag,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        let node = self.node_mut(tag)?;
        let kind = node.kind_name();
        match &mut node.kind {
            NodeKind::Props { connected_view, .. } => {
                if *connected_view != Some(view) {
                    return Err(AnimGraphError::config(format!(
                        "animated node with tag '{}' is not connected to view '{}'",
                        tag.0, view.0
                    )));
                }
                *connected_view = None;
                Ok(())
            }
            _ => Err(wrong_kind(tag, kind, "props")),
        }
    }

    /// Asks the host to reset every prop this node controls. Tolerates an
    /// unknown tag: the node may have been created and dropped within the
    /// same host batch, in which case it never touched the view.
    pub fn restore_default_values(&mut self, tag: NodeTag, view: ViewTag) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        let Some(node) = self.nodes.get(&tag) else {
            return Ok(());
        };
        match &node.kind {
            NodeKind::Props { props, .. } => {
                let mut map = PropMap::new();
                for prop in props.keys() {
                    map.insert(prop.clone(), serde_json::Value::Null);
                }
                self.host.update_view_props(view, &map);
                Ok(())
            }
            _ => Err(wrong_kind(tag, node.kind_name(), "props")),
        }
    }

    pub fn start_animating_node(
        &mut self,
        animation_id: AnimationId,
        tag: NodeTag,
        config: &serde_json::Value,
        end_callback: Option<EndCallback>,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        let config = AnimationConfig::from_value(config)?;
        self.start_animation_internal(animation_id, tag, config, end_callback)
    }

    /// Stops and removes the animation, firing its end callback with
    /// `finished = false`. An unknown id is a silent no-op: the host may
    /// legitimately race a stop against natural completion.
    pub fn stop_animation(&mut self, animation_id: AnimationId) {
        self.assert_dispatcher();
        if let Some(mut driver) = self.active_animations.remove(&animation_id)
            && let Some(callback) = driver.take_end_callback()
        {
            callback(false);
        }
    }

    /// Sets the node's raw value directly. Any animation currently targeting
    /// the node is cancelled (`finished = false`); a direct set wins.
    pub fn set_animated_node_value(&mut self, tag: NodeTag, value: f64) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.raw = value;
        self.stop_animations_for_node(tag);
        self.updated_nodes.insert(tag);
        Ok(())
    }

    pub fn set_animated_node_offset(&mut self, tag: NodeTag, offset: f64) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.offset = offset;
        self.updated_nodes.insert(tag);
        Ok(())
    }

    pub fn flatten_animated_node_offset(&mut self, tag: NodeTag) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.flatten_offset();
        Ok(())
    }

    pub fn extract_animated_node_offset(&mut self, tag: NodeTag) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.extract_offset();
        Ok(())
    }

    /// Registers the value-change listener for a value-bearing node,
    /// replacing any previous one. At most one listener per node.
    pub fn start_listening_to_animated_node_value(
        &mut self,
        tag: NodeTag,
        listener: ValueListener,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.set_listener(Some(listener));
        Ok(())
    }

    pub fn stop_listening_to_animated_node_value(&mut self, tag: NodeTag) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.value_state_mut(tag)?.set_listener(None);
        Ok(())
    }

    /// Current logical value (`offset + raw`) of a value-bearing node.
    pub fn animated_node_value(&self, tag: NodeTag) -> AnimGraphResult<f64> {
        self.assert_dispatcher();
        let node = self.node_ref(tag)?;
        node.value_state()
            .map(|state| state.value())
            .ok_or_else(|| wrong_kind(tag, node.kind_name(), "value"))
    }

    pub fn add_animated_event_to_view(
        &mut self,
        view: ViewTag,
        event_name: &str,
        mapping: &serde_json::Value,
    ) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        let mapping = EventMapping::from_value(mapping)?;
        let node = self.node_ref(mapping.animated_value_tag)?;
        if node.value_state().is_none() {
            return Err(wrong_kind(mapping.animated_value_tag, node.kind_name(), "value"));
        }
        self.event_drivers
            .entry((view, event_name.to_string()))
            .or_default()
            .push(EventAnimationDriver {
                path: mapping.native_event_path,
                node_tag: mapping.animated_value_tag,
            });
        Ok(())
    }

    /// Removes the first event binding matching the `(view, event, node)`
    /// triple. Unknown bindings are ignored.
    pub fn remove_animated_event_from_view(
        &mut self,
        view: ViewTag,
        event_name: &str,
        tag: NodeTag,
    ) {
        self.assert_dispatcher();
        let key = (view, event_name.to_string());
        if let Some(drivers) = self.event_drivers.get_mut(&key) {
            if let Some(pos) = drivers.iter().position(|d| d.node_tag == tag) {
                drivers.remove(pos);
            }
            if drivers.is_empty() {
                self.event_drivers.remove(&key);
            }
        }
    }

    /// Handle for delivering events from other threads. Dispatching through
    /// it never blocks; the event is applied when this thread next drains
    /// the queue ([`pump_events`](Self::pump_events) or `run_updates`).
    pub fn event_handle(&self) -> EventHandle {
        EventHandle::new(self.events_tx.clone())
    }

    /// Applies a UI event synchronously. Must be called on the dispatcher
    /// thread; off-thread producers go through [`event_handle`](Self::event_handle).
    pub fn on_event_dispatch(&mut self, event: AnimatedEvent) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.handle_event(event)
    }

    /// Drains marshalled off-thread events and applies each one.
    pub fn pump_events(&mut self) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.drain_pending_events()
    }

    /// Per-frame entry point: advances every active animation one step, then
    /// evaluates the affected subgraph in topological order. Finished
    /// animations fire their end callbacks (`finished = true`) after the
    /// pass and leave the active set.
    #[tracing::instrument(skip(self))]
    pub fn run_updates(&mut self, frame_time: FrameTime) -> AnimGraphResult<()> {
        self.assert_dispatcher();
        self.drain_pending_events()?;

        let mut roots: Vec<NodeTag> = self.updated_nodes.iter().copied().collect();
        self.updated_nodes.clear();

        let ids: Vec<AnimationId> = self.active_animations.keys().copied().collect();
        let mut has_finished = false;
        for id in &ids {
            let Some(mut driver) = self.active_animations.remove(id) else {
                continue;
            };
            match self.value_state_mut(driver.node_tag) {
                Ok(state) => driver.run_step(frame_time, state),
                Err(err) => {
                    self.active_animations.insert(*id, driver);
                    return Err(err);
                }
            }
            roots.push(driver.node_tag);
            if driver.has_finished {
                has_finished = true;
            }
            self.active_animations.insert(*id, driver);
        }

        self.update_nodes(&roots)?;

        if has_finished {
            for id in &ids {
                let finished = self
                    .active_animations
                    .get(id)
                    .is_some_and(|driver| driver.has_finished);
                if finished && let Some(mut driver) = self.active_animations.remove(id) {
                    tracing::debug!(animation_id = id.0, "animation finished");
                    if let Some(callback) = driver.take_end_callback() {
                        callback(true);
                    }
                }
            }
        }
        Ok(())
    }

    fn start_animation_internal(
        &mut self,
        animation_id: AnimationId,
        tag: NodeTag,
        config: AnimationConfig,
        end_callback: Option<EndCallback>,
    ) -> AnimGraphResult<()> {
        let node = self.node_ref(tag)?;
        if node.value_state().is_none() {
            return Err(wrong_kind(tag, node.kind_name(), "value"));
        }
        // Host-assigned ids may be reused; a replaced driver is dropped
        // silently.
        self.active_animations
            .insert(animation_id, AnimationDriver::new(animation_id, tag, config, end_callback));
        Ok(())
    }

    /// Cancels every animation targeting `tag`, firing callbacks with
    /// `finished = false`.
    fn stop_animations_for_node(&mut self, tag: NodeTag) {
        let ids: Vec<AnimationId> = self
            .active_animations
            .iter()
            .filter(|(_, driver)| driver.node_tag == tag)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            if let Some(mut driver) = self.active_animations.remove(&id)
                && let Some(callback) = driver.take_end_callback()
            {
                callback(false);
            }
        }
    }

    fn drain_pending_events(&mut self) -> AnimGraphResult<()> {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => self.handle_event(event)?,
                Err(_) => return Ok(()),
            }
        }
    }

    /// Applies one UI event: for each bound driver, cancel animations on its
    /// node, write the extracted payload leaf into the node, then run an
    /// update pass over exactly the touched nodes without waiting for the
    /// next frame.
    fn handle_event(&mut self, event: AnimatedEvent) -> AnimGraphResult<()> {
        if self.event_drivers.is_empty() {
            return Ok(());
        }
        let event_name = match &self.event_name_resolver {
            Some(resolver) => resolver(&event.event_name),
            None => event.event_name.clone(),
        };
        let key = (event.view_tag, event_name);
        let Some(drivers) = self.event_drivers.get(&key).cloned() else {
            return Ok(());
        };

        let mut roots = Vec::with_capacity(drivers.len());
        for driver in &drivers {
            self.stop_animations_for_node(driver.node_tag);
            let value = driver.extract(&event.payload)?;
            self.value_state_mut(driver.node_tag)?.raw = value;
            roots.push(driver.node_tag);
        }
        self.update_nodes(&roots)
    }

    /// Two-phase BFS over the active subgraph.
    ///
    /// Pass 1 marks every node reachable from the roots with a fresh color
    /// and counts, per node, how many active parents feed it. Pass 2 visits
    /// nodes in topological order: a node is enqueued only once its active
    /// in-degree drops to zero, so it always reads settled parent values.
    /// If the two passes disagree on the visit count, some in-degree never
    /// reached zero: the active subgraph has a cycle.
    fn update_nodes(&mut self, roots: &[NodeTag]) -> AnimGraphResult<()> {
        let mut active_count = 0usize;
        let mut updated_count = 0usize;
        let mut queue: VecDeque<NodeTag> = VecDeque::new();

        let color = self.next_color();
        for &tag in roots {
            let node = self.node_mut(tag)?;
            if node.bfs_color != color {
                node.bfs_color = color;
                active_count += 1;
                queue.push_back(tag);
            }
        }
        while let Some(tag) = queue.pop_front() {
            let children = self.node_ref(tag)?.children.clone();
            for child_tag in children {
                let child = self.node_mut(child_tag)?;
                child.active_incoming += 1;
                if child.bfs_color != color {
                    child.bfs_color = color;
                    active_count += 1;
                    queue.push_back(child_tag);
                }
            }
        }

        let color = self.next_color();
        for &tag in roots {
            let node = self.node_mut(tag)?;
            if node.active_incoming == 0 && node.bfs_color != color {
                node.bfs_color = color;
                updated_count += 1;
                queue.push_back(tag);
            }
        }
        while let Some(tag) = queue.pop_front() {
            self.update_node(tag)?;
            let children = self.node_ref(tag)?.children.clone();
            for child_tag in children {
                let child = self.node_mut(child_tag)?;
                child.active_incoming -= 1;
                if child.bfs_color != color && child.active_incoming == 0 {
                    child.bfs_color = color;
                    updated_count += 1;
                    queue.push_back(child_tag);
                }
            }
        }

        if active_count != updated_count {
            return Err(AnimGraphError::cycle(format!(
                "animated node graph has a cycle: {active_count} active nodes, only {updated_count} updated"
            )));
        }
        tracing::trace!(active_count, "update pass complete");
        Ok(())
    }

    /// Recomputes one node from its current inputs, then applies terminal
    /// behavior: props nodes push to the view layer, value-bearing nodes
    /// notify their listener when the value changed.
    fn update_node(&mut self, tag: NodeTag) -> AnimGraphResult<()> {
        match self.compute_node_update(tag)? {
            NodeUpdate::None => {}
            NodeUpdate::SetRaw(raw) => {
                self.value_state_mut(tag)?.raw = raw;
            }
            NodeUpdate::SetDiffClamp { raw, last_input } => {
                if let NodeKind::DiffClamp {
                    state,
                    last_input: last,
                    ..
                } = &mut self.node_mut(tag)?.kind
                {
                    state.raw = raw;
                    *last = Some(last_input);
                }
            }
            NodeUpdate::PushProps { view, props } => {
                self.host.update_view_props(view, &props);
            }
            NodeUpdate::RestartTracking {
                animation_id,
                node_tag,
                config,
            } => {
                self.start_animation_internal(animation_id, node_tag, config, None)?;
            }
        }

        if let Some(state) = self.nodes.get_mut(&tag).and_then(|n| n.value_state_mut()) {
            state.notify_listener();
        }
        Ok(())
    }

    fn compute_node_update(&self, tag: NodeTag) -> AnimGraphResult<NodeUpdate> {
        let node = self.node_ref(tag)?;
        let update = match &node.kind {
            NodeKind::Value(_) | NodeKind::Style { .. } | NodeKind::Transform { .. } => {
                NodeUpdate::None
            }
            NodeKind::Arithmetic { op, inputs, .. } => {
                let values = inputs
                    .iter()
                    .map(|&input| self.input_value(input))
                    .collect::<AnimGraphResult<Vec<f64>>>()?;
                NodeUpdate::SetRaw(op.apply(&values)?)
            }
            NodeKind::Modulus { input, modulus, .. } => {
                let value = self.input_value(*input)?;
                NodeUpdate::SetRaw(((value % modulus) + modulus) % modulus)
            }
            NodeKind::DiffClamp {
                state,
                input,
                min,
                max,
                last_input,
            } => {
                let value = self.input_value(*input)?;
                let diff = value - last_input.unwrap_or(value);
                NodeUpdate::SetDiffClamp {
                    raw: (state.value() + diff).clamp(*min, *max),
                    last_input: value,
                }
            }
            NodeKind::Interpolation {
                input_range,
                output_range,
                extrapolate_left,
                extrapolate_right,
                parent,
                ..
            } => {
                let parent = (*parent).ok_or_else(|| {
                    AnimGraphError::config(format!(
                        "interpolation node with tag '{}' is not attached to a parent",
                        tag.0
                    ))
                })?;
                let value = self.input_value(parent)?;
                NodeUpdate::SetRaw(interpolate(
                    value,
                    input_range,
                    output_range,
                    *extrapolate_left,
                    *extrapolate_right,
                ))
            }
            NodeKind::Props {
                props,
                connected_view,
            } => match connected_view {
                Some(view) => NodeUpdate::PushProps {
                    view: *view,
                    props: self.collect_props(props)?,
                },
                None => NodeUpdate::None,
            },
            NodeKind::Tracking {
                animation_id,
                to_value,
                value_node,
                animation_config,
            } => {
                let target = self.input_value(*to_value)?;
                let mut config = animation_config.clone();
                match &mut config {
                    serde_json::Value::Object(map) => {
                        map.insert("toValue".to_string(), serde_json::json!(target));
                    }
                    _ => {
                        return Err(AnimGraphError::config(
                            "tracking animation config must be a JSON object",
                        ));
                    }
                }
                NodeUpdate::RestartTracking {
                    animation_id: *animation_id,
                    node_tag: *value_node,
                    config: AnimationConfig::from_value(&config)?,
                }
            }
        };
        Ok(update)
    }

    /// Builds the prop map a props node pushes: style sources merge their
    /// entries in, transform sources contribute a transform list, value
    /// sources contribute plain numbers.
    fn collect_props(&self, mapping: &BTreeMap<String, NodeTag>) -> AnimGraphResult<PropMap> {
        let mut out = PropMap::new();
        for (prop, &source) in mapping {
            let node = self.node_ref(source)?;
            match &node.kind {
                NodeKind::Style { style } => self.collect_style(style, &mut out)?,
                NodeKind::Transform { transforms } => {
                    out.insert(prop.clone(), self.collect_transforms(transforms)?);
                }
                _ => {
                    out.insert(prop.clone(), serde_json::json!(self.input_value(source)?));
                }
            }
        }
        Ok(out)
    }

    fn collect_style(
        &self,
        style: &BTreeMap<String, NodeTag>,
        out: &mut PropMap,
    ) -> AnimGraphResult<()> {
        for (prop, &source) in style {
            let node = self.node_ref(source)?;
            match &node.kind {
                NodeKind::Transform { transforms } => {
                    out.insert(prop.clone(), self.collect_transforms(transforms)?);
                }
                _ => {
                    out.insert(prop.clone(), serde_json::json!(self.input_value(source)?));
                }
            }
        }
        Ok(())
    }

    /// Transform entries become an ordered array of single-property objects,
    /// e.g. `[{"rotate": 0.5}, {"scale": 2.0}]`.
    fn collect_transforms(&self, transforms: &[TransformSpec]) -> AnimGraphResult<serde_json::Value> {
        let mut entries = Vec::with_capacity(transforms.len());
        for spec in transforms {
            let (property, value) = match spec {
                TransformSpec::Animated { property, node_tag } => {
                    (property, self.input_value(*node_tag)?)
                }
                TransformSpec::Static { property, value } => (property, *value),
            };
            let mut entry = PropMap::new();
            entry.insert(property.clone(), serde_json::json!(value));
            entries.push(serde_json::Value::Object(entry));
        }
        Ok(serde_json::Value::Array(entries))
    }

    /// Logical value of a node used as a numeric input by a combinator,
    /// interpolation, tracking or projection node.
    fn input_value(&self, tag: NodeTag) -> AnimGraphResult<f64> {
        let node = self.node_ref(tag)?;
        node.value_state()
            .map(|state| state.value())
            .ok_or_else(|| {
                AnimGraphError::config(format!(
                    "animated node with tag '{}' is used as a numeric input but is a {} node",
                    tag.0,
                    node.kind_name()
                ))
            })
    }

    fn next_color(&mut self) -> u32 {
        self.bfs_color = self.bfs_color.wrapping_add(1);
        if self.bfs_color == NEVER_COLORED {
            // 0 marks "never visited"; skip it on wraparound.
            self.bfs_color = self.bfs_color.wrapping_add(1);
        }
        self.bfs_color
    }

    fn require_node(&self, tag: NodeTag) -> AnimGraphResult<()> {
        self.node_ref(tag).map(|_| ())
    }

    fn node_ref(&self, tag: NodeTag) -> AnimGraphResult<&AnimatedNode> {
        self.nodes.get(&tag).ok_or_else(|| missing_node(tag))
    }

    fn node_mut(&mut self, tag: NodeTag) -> AnimGraphResult<&mut AnimatedNode> {
        self.nodes.get_mut(&tag).ok_or_else(|| missing_node(tag))
    }

    fn value_state_mut(&mut self, tag: NodeTag) -> AnimGraphResult<&mut crate::node::ValueState> {
        let node = self.nodes.get_mut(&tag).ok_or_else(|| missing_node(tag))?;
        let kind = node.kind_name();
        node.value_state_mut()
            .ok_or_else(|| wrong_kind(tag, kind, "value"))
    }

    fn assert_dispatcher(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.dispatcher_thread,
            "animated nodes manager accessed off its dispatcher thread"
        );
    }
}

enum NodeUpdate {
    None,
    SetRaw(f64),
    SetDiffClamp { raw: f64, last_input: f64 },
    PushProps { view: ViewTag, props: PropMap },
    RestartTracking {
        animation_id: AnimationId,
        node_tag: NodeTag,
        config: AnimationConfig,
    },
}

fn missing_node(tag: NodeTag) -> AnimGraphError {
    AnimGraphError::config(format!("animated node with tag '{}' does not exist", tag.0))
}

fn wrong_kind(tag: NodeTag, actual: &str, expected: &str) -> AnimGraphError {
    AnimGraphError::config(format!(
        "animated node with tag '{}' is a {actual} node, expected a {expected} node",
        tag.0
    ))
}
