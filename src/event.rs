use std::sync::mpsc;

use crate::{
    core::{NodeTag, ViewTag},
    error::{AnimGraphError, AnimGraphResult},
};

/// A UI event as delivered by the host's input layer. The payload is the
/// event's body; bound drivers pull one numeric leaf out of it by path.
#[derive(Clone, Debug)]
pub struct AnimatedEvent {
    pub view_tag: ViewTag,
    pub event_name: String,
    pub payload: serde_json::Value,
}

/// Binds a `(view, event)` pair to a value node: when a matching event
/// arrives, the payload path is walked and the numeric leaf becomes the
/// node's raw value.
#[derive(Clone, Debug)]
pub(crate) struct EventAnimationDriver {
    pub path: Vec<String>,
    pub node_tag: NodeTag,
}

impl EventAnimationDriver {
    pub fn extract(&self, payload: &serde_json::Value) -> AnimGraphResult<f64> {
        let mut current = payload;
        for key in &self.path {
            current = match current {
                serde_json::Value::Object(map) => map.get(key).ok_or_else(|| {
                    AnimGraphError::config(format!("event payload has no field '{key}'"))
                })?,
                serde_json::Value::Array(items) => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(|| {
                        AnimGraphError::config(format!("event payload has no index '{key}'"))
                    })?,
                _ => {
                    return Err(AnimGraphError::config(format!(
                        "event payload path stops before '{key}'"
                    )));
                }
            };
        }
        current.as_f64().ok_or_else(|| {
            AnimGraphError::config("event payload leaf is not numeric".to_string())
        })
    }
}

/// Cloneable, `Send` handle for delivering events from off-thread producers.
/// `dispatch` only enqueues and returns immediately; the manager drains the
/// queue on its dispatcher thread (`pump_events`, or at the start of
/// `run_updates`).
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<AnimatedEvent>,
}

impl EventHandle {
    pub(crate) fn new(tx: mpsc::Sender<AnimatedEvent>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, event: AnimatedEvent) {
        if self.tx.send(event).is_err() {
            // Manager already torn down; late events are benign.
            tracing::debug!("animated event dropped: manager is gone");
        }
    }
}
