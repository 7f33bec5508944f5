#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod event;
pub mod host;
pub mod interpolate;
pub mod manager;
pub mod node;

pub use config::{AnimationConfig, EventMapping, Extrapolate, NodeConfig, TransformSpec};
pub use self::core::{AnimationId, FrameTime, NodeTag, ViewTag};
pub use driver::{AnimationDriver, EndCallback};
pub use error::{AnimGraphError, AnimGraphResult};
pub use event::{AnimatedEvent, EventHandle};
pub use host::{NullViewHost, PropMap, ViewHost};
pub use manager::AnimatedNodesManager;
pub use node::{AnimatedNode, ValueListener};
