#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Raymarch runtime
//!
//! Headless host for the navigation and volume crates. A scene file names a
//! camera path, a noise volume and a few animated effect parameters; the
//! frame loop in [`app`] ticks them at a fixed step and hands the results to
//! a [`ParameterBindingSink`](volume::ParameterBindingSink).
//!
//! There is no window, so triggers are scheduled by frame number. With
//! `--watch` the scene file is reloaded whenever it changes on disk.

pub mod app;
pub mod config;
pub mod sink;
pub mod watcher;

pub use app::{publish_pose, run, App, RunOptions, RunSummary};
pub use config::{Container, FieldOfViewConfig, SceneConfig, TweenConfig};
pub use sink::{BoundVolume, LoggingSink};
pub use watcher::SceneWatcher;
