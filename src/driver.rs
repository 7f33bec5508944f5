use crate::{
    config::AnimationConfig,
    core::{AnimationId, FrameTime, NodeTag},
    node::ValueState,
};

/// Animation end notification, invoked with `finished`: true on natural
/// completion, false on explicit or implicit stop. `FnOnce` plus the
/// `Option::take` in the manager make double invocation unrepresentable.
pub type EndCallback = Box<dyn FnOnce(bool)>;

const SIXTY_FPS_FRAME_MS: f64 = 1_000.0 / 60.0;

/// Subtracting a non-zero start can leave a boundary timestamp a ulp short
/// of its frame; nudge before truncating so it lands on the keyframe.
const FRAME_INDEX_SLOP_MS: f64 = 1e-6;

/// One in-flight animation bound to a value-bearing node. The node itself
/// stays in the manager's registry; the driver only holds its tag.
pub struct AnimationDriver {
    pub id: AnimationId,
    pub node_tag: NodeTag,
    pub has_finished: bool,
    end_callback: Option<EndCallback>,
    kind: DriverKind,
}

impl AnimationDriver {
    pub fn new(
        id: AnimationId,
        node_tag: NodeTag,
        config: AnimationConfig,
        end_callback: Option<EndCallback>,
    ) -> Self {
        let kind = match config {
            AnimationConfig::Decay {
                velocity,
                deceleration,
            } => DriverKind::Decay(DecayState {
                velocity,
                deceleration,
                start: None,
                from_value: 0.0,
                last_value: 0.0,
            }),
            AnimationConfig::Frames {
                frames,
                to_value,
                iterations,
            } => DriverKind::Frames(FramesState {
                frames,
                to_value,
                iterations,
                current_loop: 1,
                start: None,
                from_value: 0.0,
            }),
            AnimationConfig::Spring {
                to_value,
                stiffness,
                damping,
                mass,
                initial_velocity,
                rest_speed_threshold,
                rest_displacement_threshold,
                overshoot_clamping,
                iterations,
            } => DriverKind::Spring(SpringState {
                to_value,
                stiffness,
                damping,
                mass,
                initial_velocity,
                rest_speed_threshold,
                rest_displacement_threshold,
                overshoot_clamping,
                iterations,
                current_loop: 1,
                start: None,
                start_value: 0.0,
                original_value: None,
            }),
        };

        Self {
            id,
            node_tag,
            has_finished: false,
            end_callback,
            kind,
        }
    }

    /// Advances the integrator to `frame_time` and writes the new raw value
    /// into the bound node's state. No-op once finished.
    pub fn run_step(&mut self, frame_time: FrameTime, value: &mut ValueState) {
        if self.has_finished {
            return;
        }
        let finished = match &mut self.kind {
            DriverKind::Decay(state) => state.step(frame_time, value),
            DriverKind::Frames(state) => state.step(frame_time, value),
            DriverKind::Spring(state) => state.step(frame_time, value),
        };
        if finished {
            self.has_finished = true;
        }
    }

    pub fn take_end_callback(&mut self) -> Option<EndCallback> {
        self.end_callback.take()
    }
}

enum DriverKind {
    Decay(DecayState),
    Frames(FramesState),
    Spring(SpringState),
}

/// Exponential velocity decay. Finishes once the per-step delta drops
/// under 0.1.
struct DecayState {
    velocity: f64,
    deceleration: f64,
    start: Option<FrameTime>,
    from_value: f64,
    last_value: f64,
}

impl DecayState {
    fn step(&mut self, frame_time: FrameTime, value: &mut ValueState) -> bool {
        let start = match self.start {
            Some(start) => start,
            None => {
                // Backdate the start by one frame so the first step already
                // produces movement.
                let start = FrameTime::from_millis(frame_time.millis() - SIXTY_FPS_FRAME_MS);
                self.start = Some(start);
                self.from_value = value.raw;
                self.last_value = value.raw;
                start
            }
        };

        let elapsed_ms = frame_time.millis_since(start);
        let rate = 1.0 - self.deceleration;
        let next = self.from_value + (self.velocity / rate) * (1.0 - (-rate * elapsed_ms).exp());

        let finished = (next - self.last_value).abs() < 0.1;
        self.last_value = next;
        value.raw = next;
        finished
    }
}

/// Precomputed keyframe progress table sampled at a fixed 60 fps cadence.
/// Easing is baked into the table by the producer.
struct FramesState {
    frames: Vec<f64>,
    to_value: f64,
    iterations: i64,
    current_loop: i64,
    start: Option<FrameTime>,
    from_value: f64,
}

impl FramesState {
    fn step(&mut self, frame_time: FrameTime, value: &mut ValueState) -> bool {
        let start = match self.start {
            Some(start) => start,
            None => {
                self.start = Some(frame_time);
                if self.current_loop == 1 {
                    // Later iterations replay from the same starting value.
                    self.from_value = value.raw;
                }
                frame_time
            }
        };

        let elapsed_ms = frame_time.millis_since(start).max(0.0);
        let frame_index = ((elapsed_ms + FRAME_INDEX_SLOP_MS) / SIXTY_FPS_FRAME_MS) as usize;

        let mut finished = false;
        let next = if frame_index >= self.frames.len() - 1 {
            if self.iterations == -1 || self.current_loop < self.iterations {
                self.start = None;
                self.current_loop += 1;
            } else {
                finished = true;
            }
            self.to_value
        } else {
            self.from_value + self.frames[frame_index] * (self.to_value - self.from_value)
        };

        value.raw = next;
        finished
    }
}

/// Damped harmonic oscillator toward `to_value`, solved in closed form for
/// the underdamped, critically damped and overdamped regimes.
struct SpringState {
    to_value: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    initial_velocity: f64,
    rest_speed_threshold: f64,
    rest_displacement_threshold: f64,
    overshoot_clamping: bool,
    iterations: i64,
    current_loop: i64,
    start: Option<FrameTime>,
    start_value: f64,
    original_value: Option<f64>,
}

impl SpringState {
    fn step(&mut self, frame_time: FrameTime, value: &mut ValueState) -> bool {
        let start = match self.start {
            Some(start) => start,
            None => {
                self.start = Some(frame_time);
                self.start_value = value.raw;
                if self.original_value.is_none() {
                    self.original_value = Some(value.raw);
                }
                frame_time
            }
        };

        let t = frame_time.secs_since(start).max(0.0);
        let (displacement, velocity) = self.solve(t);
        let next = self.to_value + displacement;
        value.raw = next;

        let at_rest = velocity.abs() < self.rest_speed_threshold
            && (displacement.abs() < self.rest_displacement_threshold || self.stiffness == 0.0);
        let overshooting = self.stiffness > 0.0
            && ((self.start_value < self.to_value && next > self.to_value)
                || (self.start_value > self.to_value && next < self.to_value));

        if at_rest || (self.overshoot_clamping && overshooting) {
            if self.stiffness > 0.0 {
                value.raw = self.to_value;
            }
            if self.iterations == -1 || self.current_loop < self.iterations {
                self.current_loop += 1;
                self.start = None;
                // Each iteration replays the spring from the original value.
                value.raw = self.original_value.unwrap_or(self.start_value);
                return false;
            }
            return true;
        }
        false
    }

    /// Displacement from the target and velocity at `t` seconds after the
    /// (re)start of the spring.
    fn solve(&self, t: f64) -> (f64, f64) {
        let omega0 = (self.stiffness / self.mass).sqrt();
        let zeta = self.damping / (2.0 * (self.stiffness * self.mass).sqrt());
        let d0 = self.start_value - self.to_value;
        let v0 = self.initial_velocity;

        if omega0 == 0.0 {
            // Zero stiffness: pure viscous drift, treated as already settled
            // displacement-wise.
            return (d0, v0 * (-self.damping / self.mass * t).exp());
        }

        if zeta < 1.0 - f64::EPSILON {
            // Underdamped.
            let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega0 * t).exp();
            let a = d0;
            let b = (v0 + zeta * omega0 * d0) / omega_d;
            let (sin, cos) = (omega_d * t).sin_cos();
            let displacement = envelope * (a * cos + b * sin);
            let velocity =
                envelope * ((-zeta * omega0 * a + omega_d * b) * cos - (zeta * omega0 * b + omega_d * a) * sin);
            (displacement, velocity)
        } else if zeta > 1.0 + f64::EPSILON {
            // Overdamped.
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = omega0 * (-zeta + root);
            let r2 = omega0 * (-zeta - root);
            let c1 = (v0 - r2 * d0) / (r1 - r2);
            let c2 = d0 - c1;
            let e1 = (r1 * t).exp();
            let e2 = (r2 * t).exp();
            (c1 * e1 + c2 * e2, c1 * r1 * e1 + c2 * r2 * e2)
        } else {
            // Critically damped.
            let envelope = (-omega0 * t).exp();
            let b = v0 + omega0 * d0;
            let displacement = envelope * (d0 + b * t);
            let velocity = envelope * (b - omega0 * (d0 + b * t));
            (displacement, velocity)
        }
    }
}
