//! Tick-driven scalar animation, used for effect parameters such as a
//! fractal's radius or the camera's field of view.

fn smoothstep(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Eases a value through a list of targets, one after another.
///
/// Each step starts from wherever the value is and reaches its target after
/// `1 / rate` seconds, following a smoothstep curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTween {
    targets: Vec<f32>,
    rate: f32,
    value: f32,
    start: f32,
    t: f32,
    step: usize,
    active: bool,
}

impl ScalarTween {
    #[must_use]
    pub fn new(initial: f32, targets: Vec<f32>, rate: f32) -> Self {
        Self {
            targets,
            rate,
            value: initial,
            start: initial,
            t: 0.0,
            step: 0,
            active: false,
        }
    }

    /// Restarts the sequence from its first target. Returns `false` when
    /// there is nothing to animate.
    pub fn trigger(&mut self) -> bool {
        if self.targets.is_empty() {
            tracing::warn!("tween triggered with no targets");
            return false;
        }
        self.step = 0;
        self.start = self.value;
        self.t = 0.0;
        self.active = true;
        true
    }

    /// Advances by `dt` seconds. Returns the new value while active.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        if !self.active {
            return None;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.t += dt * self.rate;
        let target = self.targets[self.step];
        self.value = self.start + (target - self.start) * smoothstep(self.t);

        if self.t >= 1.0 {
            self.step += 1;
            if self.step < self.targets.len() {
                self.start = self.value;
                self.t = 0.0;
            } else {
                self.active = false;
            }
        }
        Some(self.value)
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Moves a value a fixed fraction of the remaining distance every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialApproach {
    from: f32,
    target: f32,
    rate: f32,
    value: f32,
}

impl ExponentialApproach {
    #[must_use]
    pub fn new(from: f32, target: f32, rate: f32) -> Self {
        Self {
            from,
            target,
            rate,
            value: from,
        }
    }

    /// Snaps back to the starting value.
    pub fn trigger(&mut self) {
        self.value = self.from;
    }

    pub fn tick(&mut self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let amount = (dt * self.rate).clamp(0.0, 1.0);
        self.value += (self.target - self.value) * amount;
        self.value
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tween_walks_every_target() {
        let mut tween = ScalarTween::new(1.0, vec![0.5, 2.0], 2.0);
        assert!(tween.trigger());
        let mut seen = Vec::new();
        while let Some(v) = tween.tick(0.1) {
            seen.push(v);
        }
        assert!(seen.iter().any(|v| (v - 0.5).abs() < 1e-5));
        assert!((tween.value() - 2.0).abs() < 1e-5);
        assert!(!tween.is_active());
    }

    #[test]
    fn tween_eases_in() {
        let mut tween = ScalarTween::new(0.0, vec![1.0], 1.0);
        tween.trigger();
        let first = tween.tick(0.1).unwrap();
        assert!(first < 0.1);
    }

    #[test]
    fn empty_tween_does_not_start() {
        let mut tween = ScalarTween::new(3.0, Vec::new(), 1.0);
        assert!(!tween.trigger());
        assert_eq!(tween.tick(1.0), None);
    }

    #[test]
    fn approach_converges() {
        let mut fov = ExponentialApproach::new(60.0, 30.0, 3.0);
        for _ in 0..300 {
            fov.tick(1.0 / 60.0);
        }
        assert!((fov.value() - 30.0).abs() < 0.01);
        fov.trigger();
        assert_eq!(fov.value(), 60.0);
    }
}
