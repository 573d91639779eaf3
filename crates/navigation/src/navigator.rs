//! Frame-driven playback of a camera path.
//!
//! The navigator is idle until [`PathNavigator::trigger`] starts it. Every
//! [`PathNavigator::tick`] then advances it by one frame and yields the pose
//! for that frame. Playback ends when the whole path has been covered.

use crate::curve::{arc_direction, Curve, CurveKind};
use crate::{NavigationError, Pose, SegmentLengthTable, StableUp};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigatorPhase {
    #[default]
    Idle,
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigatorState {
    /// Distance covered, or seconds elapsed under keyframed timing.
    pub traveled: f32,
    pub segment: usize,
    pub phase: NavigatorPhase,
}

impl NavigatorState {
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.phase == NavigatorPhase::Moving
    }
}

/// How playback time maps onto the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTiming {
    /// Constant speed along the curve, using its arc-length table.
    #[default]
    ArcLength,
    /// Segment `i` takes `points[i + 1].duration` seconds. Position and
    /// rotation are slerped between consecutive control points.
    Keyframed,
}

pub struct PathNavigator {
    curve: Curve,
    table: SegmentLengthTable,
    timeline: Option<SegmentLengthTable>,
    timing: PathTiming,
    speed: f32,
    look_at: Option<Vec3>,
    stable_up: StableUp,
    state: NavigatorState,
}

fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

impl PathNavigator {
    /// An idle navigator moving at `speed` units per second along `curve`.
    #[must_use]
    pub fn new(curve: Curve, speed: f32) -> Self {
        let table = SegmentLengthTable::for_curve(&curve);
        Self {
            curve,
            table,
            timeline: None,
            timing: PathTiming::ArcLength,
            speed,
            look_at: None,
            stable_up: StableUp::default(),
            state: NavigatorState::default(),
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: PathTiming) -> Self {
        self.timing = timing;
        self.timeline = Self::build_timeline(&self.curve, timing);
        self
    }

    /// Keeps the camera pointed at `target` instead of following the curve's
    /// own orientation.
    #[must_use]
    pub fn with_look_at(mut self, target: Option<Vec3>) -> Self {
        self.look_at = target;
        self
    }

    /// Rebuilds the arc-length table at a custom resolution.
    #[must_use]
    pub fn with_samples_per_segment(mut self, samples: usize) -> Self {
        self.table = SegmentLengthTable::build(&self.curve, samples);
        self
    }

    fn build_timeline(curve: &Curve, timing: PathTiming) -> Option<SegmentLengthTable> {
        match (timing, curve) {
            (PathTiming::Keyframed, Curve::CatmullRom { points }) => Some(
                SegmentLengthTable::from_lengths(points.iter().skip(1).map(|p| p.duration).collect()),
            ),
            _ => None,
        }
    }

    /// Replaces the path, rebuilding its tables, and stops playback.
    pub fn set_curve(&mut self, curve: Curve) {
        let samples = self.table.samples_per_segment().max(1);
        let samples = if self.curve.kind() == curve.kind() {
            samples
        } else {
            curve.kind().default_samples()
        };
        self.table = SegmentLengthTable::build(&curve, samples);
        self.timeline = Self::build_timeline(&curve, self.timing);
        self.curve = curve;
        self.state = NavigatorState::default();
        tracing::debug!(kind = ?self.curve.kind(), total = self.table.total(), "path replaced");
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_look_at(&mut self, target: Option<Vec3>) {
        self.look_at = target;
    }

    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    #[must_use]
    pub fn table(&self) -> &SegmentLengthTable {
        &self.table
    }

    #[must_use]
    pub fn timing(&self) -> PathTiming {
        self.timing
    }

    #[must_use]
    pub fn state(&self) -> NavigatorState {
        self.state
    }

    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state.is_moving()
    }

    /// Length of the path, or its duration in seconds under keyframed timing.
    #[must_use]
    pub fn total(&self) -> f32 {
        match &self.timeline {
            Some(timeline) => timeline.total(),
            None => self.table.total(),
        }
    }

    fn check_playable(&self) -> Result<(), NavigationError> {
        match self.timing {
            PathTiming::ArcLength => self.curve.validate()?,
            PathTiming::Keyframed => {
                let kind = self.curve.kind();
                let actual = self.curve.point_count();
                if kind != CurveKind::CatmullRom || actual < 2 {
                    return Err(NavigationError::InvalidPath {
                        kind,
                        required: 2,
                        actual,
                    });
                }
            }
        }
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(NavigationError::DegeneratePath);
        }
        Ok(())
    }

    /// Starts playback from the beginning of the path.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::InvalidPath`] if the curve has too few
    /// points and [`NavigationError::DegeneratePath`] if it has no length. The
    /// navigator is left unchanged in both cases.
    pub fn trigger(&mut self) -> Result<(), NavigationError> {
        self.check_playable()?;
        self.state = NavigatorState {
            traveled: 0.0,
            segment: 0,
            phase: NavigatorPhase::Moving,
        };
        self.stable_up.reset();
        tracing::info!(kind = ?self.curve.kind(), timing = ?self.timing, total = self.total(), "path playback started");
        Ok(())
    }

    /// Advances playback by `dt` seconds and returns the new pose.
    ///
    /// Returns `None` while idle. Under arc-length timing the tick that
    /// reaches the end of the path also returns `None`, leaving the previous
    /// pose in place. Keyframed playback lands on its last keyframe instead.
    pub fn tick(&mut self, dt: f32) -> Option<Pose> {
        if !self.state.is_moving() {
            return None;
        }
        let dt = sanitize_dt(dt);

        match self.timing {
            PathTiming::ArcLength => {
                self.state.traveled += (self.speed * dt).max(0.0);
                if self.state.traveled >= self.table.total() {
                    self.finish();
                    return None;
                }
                let (segment, t) = self.table.lookup(self.state.traveled);
                self.state.segment = segment;
                let pose = self.curve.evaluate(segment, t);
                Some(self.aim(pose, dt))
            }
            PathTiming::Keyframed => {
                self.state.traveled += dt;
                let finished = self.state.traveled >= self.total();
                let (segment, t) = match &self.timeline {
                    Some(timeline) => timeline.lookup(self.state.traveled),
                    None => (0, 1.0),
                };
                self.state.segment = segment;
                let pose = self.keyframe_pose(segment, t);
                if finished {
                    self.finish();
                }
                Some(self.aim(pose, dt))
            }
        }
    }

    fn finish(&mut self) {
        self.state.phase = NavigatorPhase::Idle;
        tracing::info!(traveled = self.state.traveled, "path playback finished");
    }

    fn keyframe_pose(&self, segment: usize, t: f32) -> Pose {
        let Curve::CatmullRom { points } = &self.curve else {
            return self.curve.evaluate(segment, t);
        };
        let Some(last) = points.len().checked_sub(1) else {
            return Pose::default();
        };
        let from = &points[segment.min(last)];
        let to = &points[(segment + 1).min(last)];
        Pose::new(
            slerp_vector(from.position, to.position, t),
            from.rotation.slerp(to.rotation, t),
        )
    }

    fn aim(&mut self, pose: Pose, dt: f32) -> Pose {
        let Some(target) = self.look_at else {
            return pose;
        };
        let Some(forward) = (target - pose.position).try_normalize() else {
            return pose;
        };
        let up = self.stable_up.update(forward, dt);
        Pose::new(pose.position, Pose::look_rotation(forward, up))
    }
}

/// Interpolates direction along the great circle and magnitude linearly.
fn slerp_vector(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    match (a.try_normalize(), b.try_normalize()) {
        (Some(da), Some(db)) => {
            let length = a.length() + (b.length() - a.length()) * t;
            arc_direction(da, db, t) * length
        }
        _ => a.lerp(b, t),
    }
}
