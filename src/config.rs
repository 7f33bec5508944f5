use std::collections::BTreeMap;

use crate::{
    core::{AnimationId, NodeTag},
    error::{AnimGraphError, AnimGraphResult},
};

/// Node construction payload received from the bridge. The `type` field is
/// the discriminator; the recognized set is closed here, so an unknown
/// discriminator fails at deserialization rather than deep inside the graph.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeConfig {
    Value {
        #[serde(default)]
        value: f64,
        #[serde(default)]
        offset: f64,
    },
    Style {
        style: BTreeMap<String, NodeTag>,
    },
    Props {
        props: BTreeMap<String, NodeTag>,
    },
    Interpolation {
        input_range: Vec<f64>,
        output_range: Vec<f64>,
        #[serde(default)]
        extrapolate_left: Extrapolate,
        #[serde(default)]
        extrapolate_right: Extrapolate,
    },
    Addition {
        input: Vec<NodeTag>,
    },
    Subtraction {
        input: Vec<NodeTag>,
    },
    Multiplication {
        input: Vec<NodeTag>,
    },
    Division {
        input: Vec<NodeTag>,
    },
    Modulus {
        input: NodeTag,
        modulus: f64,
    },
    Diffclamp {
        input: NodeTag,
        min: f64,
        max: f64,
    },
    Transform {
        transforms: Vec<TransformSpec>,
    },
    Tracking {
        animation_id: AnimationId,
        to_value: NodeTag,
        value: NodeTag,
        animation_config: serde_json::Value,
    },
}

impl NodeConfig {
    pub fn from_value(config: &serde_json::Value) -> AnimGraphResult<Self> {
        let parsed: Self = serde_json::from_value(config.clone())
            .map_err(|e| AnimGraphError::config(format!("invalid node config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> AnimGraphResult<()> {
        match self {
            Self::Interpolation {
                input_range,
                output_range,
                ..
            } => {
                if input_range.len() < 2 {
                    return Err(AnimGraphError::config(
                        "interpolation input range needs at least 2 entries",
                    ));
                }
                if input_range.len() != output_range.len() {
                    return Err(AnimGraphError::config(
                        "interpolation input and output ranges must have equal lengths",
                    ));
                }
                if !input_range.windows(2).all(|w| w[0] <= w[1]) {
                    return Err(AnimGraphError::config(
                        "interpolation input range must be sorted ascending",
                    ));
                }
                Ok(())
            }
            Self::Subtraction { input } | Self::Division { input } => {
                if input.is_empty() {
                    return Err(AnimGraphError::config(
                        "subtraction/division node needs at least one input",
                    ));
                }
                Ok(())
            }
            Self::Modulus { modulus, .. } => {
                if *modulus == 0.0 {
                    return Err(AnimGraphError::config("modulus node needs a nonzero modulus"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Extrapolation behavior outside the interpolation input range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolate {
    #[default]
    Extend,
    Clamp,
    Identity,
}

/// One entry of a transform node: either driven by another node or a fixed
/// scalar.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TransformSpec {
    Animated { property: String, node_tag: NodeTag },
    Static { property: String, value: f64 },
}

/// Animation construction payload for `start_animating_node`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AnimationConfig {
    Decay {
        velocity: f64,
        #[serde(default = "default_deceleration")]
        deceleration: f64,
    },
    Frames {
        frames: Vec<f64>,
        to_value: f64,
        #[serde(default = "default_iterations")]
        iterations: i64,
    },
    Spring {
        to_value: f64,
        #[serde(default = "default_stiffness")]
        stiffness: f64,
        #[serde(default = "default_damping")]
        damping: f64,
        #[serde(default = "default_mass")]
        mass: f64,
        #[serde(default)]
        initial_velocity: f64,
        #[serde(default = "default_rest_threshold")]
        rest_speed_threshold: f64,
        #[serde(default = "default_rest_threshold")]
        rest_displacement_threshold: f64,
        #[serde(default)]
        overshoot_clamping: bool,
        #[serde(default = "default_iterations")]
        iterations: i64,
    },
}

fn default_deceleration() -> f64 {
    0.998
}

fn default_iterations() -> i64 {
    1
}

fn default_stiffness() -> f64 {
    100.0
}

fn default_damping() -> f64 {
    10.0
}

fn default_mass() -> f64 {
    1.0
}

fn default_rest_threshold() -> f64 {
    0.001
}

impl AnimationConfig {
    pub fn from_value(config: &serde_json::Value) -> AnimGraphResult<Self> {
        let parsed: Self = serde_json::from_value(config.clone())
            .map_err(|e| AnimGraphError::config(format!("invalid animation config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> AnimGraphResult<()> {
        match self {
            Self::Decay { deceleration, .. } => {
                if !(*deceleration < 1.0) {
                    return Err(AnimGraphError::config(
                        "decay deceleration must be less than 1",
                    ));
                }
                Ok(())
            }
            Self::Frames { frames, .. } => {
                if frames.is_empty() {
                    return Err(AnimGraphError::config(
                        "frames animation needs a non-empty frame table",
                    ));
                }
                Ok(())
            }
            Self::Spring { stiffness, mass, .. } => {
                if *stiffness < 0.0 || *mass <= 0.0 {
                    return Err(AnimGraphError::config(
                        "spring needs non-negative stiffness and positive mass",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Binding payload for `add_animated_event_to_view`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMapping {
    pub animated_value_tag: NodeTag,
    pub native_event_path: Vec<String>,
}

impl EventMapping {
    pub fn from_value(mapping: &serde_json::Value) -> AnimGraphResult<Self> {
        serde_json::from_value(mapping.clone())
            .map_err(|e| AnimGraphError::config(format!("invalid event mapping: {e}")))
    }
}
