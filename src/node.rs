use std::collections::BTreeMap;

use crate::{
    config::{Extrapolate, NodeConfig, TransformSpec},
    core::{AnimationId, NodeTag, ViewTag},
    error::{AnimGraphError, AnimGraphResult},
};

/// Color value a node carries before it has ever been visited. Reserved: the
/// manager's generation counter skips it on wraparound.
pub(crate) const NEVER_COLORED: u32 = 0;

/// Value-change callback registered on a value-bearing node. At most one per
/// node; registering a new one replaces the previous.
pub type ValueListener = Box<dyn FnMut(f64)>;

/// Numeric state shared by every value-bearing node kind. The logical value
/// observed by the rest of the graph is always `offset + raw`.
pub struct ValueState {
    pub raw: f64,
    pub offset: f64,
    listener: Option<ValueListener>,
    last_notified: Option<f64>,
}

impl ValueState {
    pub fn new(raw: f64, offset: f64) -> Self {
        Self {
            raw,
            offset,
            listener: None,
            last_notified: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.offset + self.raw
    }

    /// Folds the offset into the raw value. The logical value is unchanged.
    pub fn flatten_offset(&mut self) {
        self.raw += self.offset;
        self.offset = 0.0;
    }

    /// Moves the raw value into the offset. The logical value is unchanged.
    pub fn extract_offset(&mut self) {
        self.offset += self.raw;
        self.raw = 0.0;
    }

    pub fn set_listener(&mut self, listener: Option<ValueListener>) {
        self.listener = listener;
        self.last_notified = None;
    }

    /// Fires the listener if one is registered and the logical value changed
    /// since the last notification.
    pub fn notify_listener(&mut self) {
        let value = self.value();
        if let Some(listener) = self.listener.as_mut()
            && self.last_notified != Some(value)
        {
            listener(value);
            self.last_notified = Some(value);
        }
    }
}

impl std::fmt::Debug for ValueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueState")
            .field("raw", &self.raw)
            .field("offset", &self.offset)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    /// Folds resolved input values. Division by zero is reported, never
    /// folded into an infinity.
    pub fn apply(self, inputs: &[f64]) -> AnimGraphResult<f64> {
        match self {
            Self::Add => Ok(inputs.iter().sum()),
            Self::Multiply => Ok(inputs.iter().product()),
            Self::Subtract => {
                let first = first_input(inputs)?;
                Ok(inputs[1..].iter().fold(first, |acc, v| acc - v))
            }
            Self::Divide => {
                let first = first_input(inputs)?;
                inputs[1..].iter().try_fold(first, |acc, &v| {
                    if v == 0.0 {
                        Err(AnimGraphError::arithmetic("division by zero in divide node"))
                    } else {
                        Ok(acc / v)
                    }
                })
            }
        }
    }
}

fn first_input(inputs: &[f64]) -> AnimGraphResult<f64> {
    inputs
        .first()
        .copied()
        .ok_or_else(|| AnimGraphError::config("combinator node has no inputs"))
}

#[derive(Debug)]
pub enum NodeKind {
    Value(ValueState),
    Interpolation {
        state: ValueState,
        input_range: Vec<f64>,
        output_range: Vec<f64>,
        extrapolate_left: Extrapolate,
        extrapolate_right: Extrapolate,
        /// Cached on attach; interpolation reads exactly one upstream value.
        parent: Option<NodeTag>,
    },
    Arithmetic {
        state: ValueState,
        op: ArithmeticOp,
        inputs: Vec<NodeTag>,
    },
    Modulus {
        state: ValueState,
        input: NodeTag,
        modulus: f64,
    },
    DiffClamp {
        state: ValueState,
        input: NodeTag,
        min: f64,
        max: f64,
        last_input: Option<f64>,
    },
    Style {
        style: BTreeMap<String, NodeTag>,
    },
    Transform {
        transforms: Vec<TransformSpec>,
    },
    Props {
        props: BTreeMap<String, NodeTag>,
        connected_view: Option<ViewTag>,
    },
    Tracking {
        animation_id: AnimationId,
        to_value: NodeTag,
        value_node: NodeTag,
        animation_config: serde_json::Value,
    },
}

/// One node of the animated graph. Children are non-owning tag references
/// used purely for traversal; the manager's registry owns every node.
#[derive(Debug)]
pub struct AnimatedNode {
    pub tag: NodeTag,
    pub children: Vec<NodeTag>,
    pub(crate) bfs_color: u32,
    pub(crate) active_incoming: u32,
    pub kind: NodeKind,
}

impl AnimatedNode {
    pub fn from_config(tag: NodeTag, config: NodeConfig) -> Self {
        let kind = match config {
            NodeConfig::Value { value, offset } => NodeKind::Value(ValueState::new(value, offset)),
            NodeConfig::Style { style } => NodeKind::Style { style },
            NodeConfig::Props { props } => NodeKind::Props {
                props,
                connected_view: None,
            },
            NodeConfig::Interpolation {
                input_range,
                output_range,
                extrapolate_left,
                extrapolate_right,
            } => NodeKind::Interpolation {
                state: ValueState::new(0.0, 0.0),
                input_range,
                output_range,
                extrapolate_left,
                extrapolate_right,
                parent: None,
            },
            NodeConfig::Addition { input } => arithmetic(ArithmeticOp::Add, input),
            NodeConfig::Subtraction { input } => arithmetic(ArithmeticOp::Subtract, input),
            NodeConfig::Multiplication { input } => arithmetic(ArithmeticOp::Multiply, input),
            NodeConfig::Division { input } => arithmetic(ArithmeticOp::Divide, input),
            NodeConfig::Modulus { input, modulus } => NodeKind::Modulus {
                state: ValueState::new(0.0, 0.0),
                input,
                modulus,
            },
            NodeConfig::Diffclamp { input, min, max } => NodeKind::DiffClamp {
                state: ValueState::new(0.0, 0.0),
                input,
                min,
                max,
                last_input: None,
            },
            NodeConfig::Transform { transforms } => NodeKind::Transform { transforms },
            NodeConfig::Tracking {
                animation_id,
                to_value,
                value,
                animation_config,
            } => NodeKind::Tracking {
                animation_id,
                to_value,
                value_node: value,
                animation_config,
            },
        };

        Self {
            tag,
            children: Vec::new(),
            bfs_color: NEVER_COLORED,
            active_incoming: 0,
            kind,
        }
    }

    /// Appends a child edge. Edges are insertion-ordered and deliberately not
    /// deduplicated; one edge is added per connect call.
    pub(crate) fn add_child(&mut self, child: NodeTag) {
        self.children.push(child);
    }

    /// Removes the first matching child edge, if any.
    pub(crate) fn remove_child(&mut self, child: NodeTag) -> bool {
        if let Some(pos) = self.children.iter().position(|&c| c == child) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) fn on_attached_to(&mut self, parent: NodeTag) -> AnimGraphResult<()> {
        if let NodeKind::Interpolation { parent: cached, .. } = &mut self.kind {
            // A projection reads exactly one upstream value; a second parent
            // would silently retarget it.
            if cached.is_some() {
                return Err(AnimGraphError::config(format!(
                    "interpolation node with tag '{}' already has a parent",
                    self.tag.0
                )));
            }
            *cached = Some(parent);
        }
        Ok(())
    }

    pub(crate) fn on_detached_from(&mut self, parent: NodeTag) {
        if let NodeKind::Interpolation { parent: cached, .. } = &mut self.kind
            && *cached == Some(parent)
        {
            *cached = None;
        }
    }

    pub fn value_state(&self) -> Option<&ValueState> {
        match &self.kind {
            NodeKind::Value(state)
            | NodeKind::Interpolation { state, .. }
            | NodeKind::Arithmetic { state, .. }
            | NodeKind::Modulus { state, .. }
            | NodeKind::DiffClamp { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn value_state_mut(&mut self) -> Option<&mut ValueState> {
        match &mut self.kind {
            NodeKind::Value(state)
            | NodeKind::Interpolation { state, .. }
            | NodeKind::Arithmetic { state, .. }
            | NodeKind::Modulus { state, .. }
            | NodeKind::DiffClamp { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Value(_) => "value",
            NodeKind::Interpolation { .. } => "interpolation",
            NodeKind::Arithmetic { op, .. } => match op {
                ArithmeticOp::Add => "addition",
                ArithmeticOp::Subtract => "subtraction",
                ArithmeticOp::Multiply => "multiplication",
                ArithmeticOp::Divide => "division",
            },
            NodeKind::Modulus { .. } => "modulus",
            NodeKind::DiffClamp { .. } => "diffclamp",
            NodeKind::Style { .. } => "style",
            NodeKind::Transform { .. } => "transform",
            NodeKind::Props { .. } => "props",
            NodeKind::Tracking { .. } => "tracking",
        }
    }
}

fn arithmetic(op: ArithmeticOp, inputs: Vec<NodeTag>) -> NodeKind {
    NodeKind::Arithmetic {
        state: ValueState::new(0.0, 0.0),
        op,
        inputs,
    }
}
