use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

/// Per-window animation clock plus the eased Y rotation of the cube.
#[derive(Debug, Clone)]
pub struct AnimationState {
    elapsed: Duration,
    rotation: f32,
    target: f32,
    step: f32,
}

impl AnimationState {
    pub fn new(step: f32) -> Self {
        Self {
            elapsed: Duration::ZERO,
            rotation: 0.0,
            target: 0.0,
            step: step.abs(),
        }
    }

    /// Time since the window was mounted. Narrowed to `f32` only when it is
    /// written into the uniform block.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// One frame: accumulate time and move the rotation at most one step
    /// toward the target. The step is per frame, not per second.
    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
        if self.rotation < self.target {
            self.rotation = (self.rotation + self.step).min(self.target);
        } else if self.rotation > self.target {
            self.rotation = (self.rotation - self.step).max(self.target);
        }
    }

    pub fn rotate_by(&mut self, radians: f32) {
        self.target += radians;
    }

    pub fn rotate_left(&mut self) {
        self.rotate_by(-FRAC_PI_2);
    }

    pub fn rotate_right(&mut self) {
        self.rotate_by(FRAC_PI_2);
    }
}
