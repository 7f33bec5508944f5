use crate::core::ViewTag;

/// Prop map pushed to the view layer, keyed by prop name. A `null` value
/// asks the host to restore that prop's default.
pub type PropMap = serde_json::Map<String, serde_json::Value>;

/// The view/property layer this engine drives. Implemented by the host;
/// called synchronously from the dispatcher thread at the end of each
/// update pass.
pub trait ViewHost {
    fn update_view_props(&mut self, view: ViewTag, props: &PropMap);
}

/// Host that discards every prop push. Useful for tests and headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullViewHost;

impl ViewHost for NullViewHost {
    fn update_view_props(&mut self, _view: ViewTag, _props: &PropMap) {}
}
