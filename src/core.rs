use serde::{Deserialize, Serialize};

/// Identity of an animated node. Assigned by the host; the namespace is
/// shared across all node kinds of one manager instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeTag(pub u64);

/// Identity of an in-flight animation, assigned (and possibly reused) by the
/// host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

/// Identity of a native view on the host side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewTag(pub u64);

/// Monotonic frame timestamp handed to `run_updates` by the host's frame
/// callback. Drivers are pure functions of this value and never sample a
/// clock themselves.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct FrameTime {
    millis: f64,
}

impl FrameTime {
    pub fn from_millis(millis: f64) -> Self {
        Self { millis }
    }

    pub fn from_secs(secs: f64) -> Self {
        Self {
            millis: secs * 1_000.0,
        }
    }

    pub fn millis(self) -> f64 {
        self.millis
    }

    /// Elapsed milliseconds since `earlier`.
    pub fn millis_since(self, earlier: FrameTime) -> f64 {
        self.millis - earlier.millis
    }

    /// Elapsed seconds since `earlier`.
    pub fn secs_since(self, earlier: FrameTime) -> f64 {
        (self.millis - earlier.millis) / 1_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_time_deltas() {
        let a = FrameTime::from_millis(500.0);
        let b = FrameTime::from_secs(2.0);
        assert_eq!(b.millis_since(a), 1_500.0);
        assert_eq!(b.secs_since(a), 1.5);
    }

    #[test]
    fn tags_order_by_value() {
        assert!(NodeTag(1) < NodeTag(2));
        assert!(AnimationId(7) > AnimationId(3));
    }
}
