#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
//! # Camera path navigation
//!
//! Moves a camera along authored curves at constant speed, one frame at a
//! time.
//!
//! ## Key Components
//!
//! -   **Curves:** [`Curve`] covers Catmull-Rom splines through
//!     [`ControlPoint`]s, great-circle arcs around a centre, and a closed-form
//!     logarithmic spiral. Each evaluates to a [`Pose`].
//! -   **Arc length:** [`SegmentLengthTable`] estimates segment lengths by
//!     sampling so travelled distance can be turned back into a curve
//!     parameter.
//! -   **Playback:** [`PathNavigator`] is an idle/moving state machine driven
//!     by an explicit `tick(dt)`. With a look-at target it steers the up
//!     vector through [`StableUp`] so the camera does not flip near the poles.
//! -   **Tweens:** [`ScalarTween`] and [`ExponentialApproach`] animate single
//!     effect parameters on the same tick.
//!
//! ```rust,ignore
//! let mut nav = PathNavigator::new(curve, 5.0).with_look_at(Some(Vec3::ZERO));
//! nav.trigger()?;
//! while let Some(pose) = nav.tick(1.0 / 60.0) {
//!     camera.set_view(pose.view_matrix());
//! }
//! ```

pub mod arc_length;
pub mod control_point;
pub mod curve;
pub mod error;
pub mod navigator;
pub mod pose;
pub mod stable_up;
pub mod tween;

pub use arc_length::SegmentLengthTable;
pub use control_point::ControlPoint;
pub use curve::{Curve, CurveKind, SpiralParams};
pub use error::NavigationError;
pub use navigator::{NavigatorPhase, NavigatorState, PathNavigator, PathTiming};
pub use pose::Pose;
pub use stable_up::StableUp;
pub use tween::{ExponentialApproach, ScalarTween};
