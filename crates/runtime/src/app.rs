//! # Frame loop
//!
//! [`App`] owns the camera path, the noise volume cache and the effect tweens
//! and pushes their outputs into a [`ParameterBindingSink`] once per tick.
//! [`run`] drives an `App` headlessly: it loads the scene, fires triggers on
//! scheduled frames and reloads the scene when the watcher reports a change.

use anyhow::{Context, Result};
use compute::{ComputeDevice, ComputeError, VolumeHandle};
use navigation::{ExponentialApproach, PathNavigator, Pose, ScalarTween};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use volume::{
    publish_volume, NoiseFieldBuilder, NoiseFieldCache, NoiseParams, ParameterBindingSink,
    VolumeBounds,
};

use crate::config::SceneConfig;
use crate::sink::LoggingSink;
use crate::watcher::SceneWatcher;

pub const CAMERA_POSITION: &str = "_CameraPosition";
pub const CAMERA_ROTATION: &str = "_CameraRotation";
pub const FIELD_OF_VIEW: &str = "_FieldOfView";

const LOG_INTERVAL: u64 = 60;

/// Writes the pose as `_CameraPosition` (w = 1) and `_CameraRotation`
/// (quaternion xyzw).
pub fn publish_pose<S: ParameterBindingSink + ?Sized>(sink: &mut S, pose: &Pose) {
    sink.set_vector(CAMERA_POSITION, pose.position.extend(1.0));
    sink.set_vector(CAMERA_ROTATION, pose.rotation.into());
}

struct NamedTween {
    name: String,
    tween: ScalarTween,
}

pub struct App<S> {
    navigator: PathNavigator,
    cache: NoiseFieldCache,
    noise: Option<NoiseParams>,
    slot: String,
    bounds: VolumeBounds,
    tweens: Vec<NamedTween>,
    field_of_view: Option<ExponentialApproach>,
    published: Option<VolumeHandle>,
    build_failed: bool,
    /// Builds made by caches this app has since replaced.
    retired_builds: u64,
    sink: S,
}

fn navigator_for(scene: &SceneConfig) -> PathNavigator {
    PathNavigator::new(scene.path.clone(), scene.speed)
        .with_timing(scene.timing)
        .with_look_at(scene.look_at)
}

fn tweens_for(scene: &SceneConfig) -> Vec<NamedTween> {
    scene
        .tweens
        .iter()
        .map(|t| NamedTween {
            name: t.name.clone(),
            tween: ScalarTween::new(t.initial, t.targets.clone(), t.rate),
        })
        .collect()
}

impl<S: ParameterBindingSink> App<S> {
    #[must_use]
    pub fn new(scene: SceneConfig, device: Arc<dyn ComputeDevice>, sink: S) -> Self {
        let builder = NoiseFieldBuilder::new(device).with_mips(scene.generate_mips);
        Self {
            navigator: navigator_for(&scene),
            cache: NoiseFieldCache::new(builder),
            noise: scene.noise,
            bounds: scene.container.bounds(),
            tweens: tweens_for(&scene),
            field_of_view: scene
                .field_of_view
                .map(|f| ExponentialApproach::new(f.from, f.to, f.rate)),
            slot: scene.noise_slot,
            published: None,
            build_failed: false,
            retired_builds: 0,
            sink,
        }
    }

    /// Replaces the scene. Playback stops and the volume is rebuilt on the
    /// next tick.
    pub fn apply_scene(&mut self, scene: SceneConfig) {
        info!(kind = ?scene.path.kind(), "applying scene");
        if self.slot != scene.noise_slot && self.published.take().is_some() {
            self.sink.unbind_volume(&self.slot);
        }

        if self.cache.builder().generates_mips() == scene.generate_mips {
            self.cache.invalidate();
        } else {
            let builder = NoiseFieldBuilder::new(Arc::clone(self.cache.builder().device()))
                .with_mips(scene.generate_mips);
            if let Err(err) = self.cache.release() {
                warn!("failed to release noise volume: {err}");
            }
            self.retired_builds += self.cache.builds();
            self.cache = NoiseFieldCache::new(builder);
        }

        if scene.noise.is_none() {
            if let Err(err) = self.cache.release() {
                warn!("failed to release noise volume: {err}");
            }
            if self.published.take().is_some() {
                self.sink.unbind_volume(&self.slot);
            }
        }

        self.navigator = navigator_for(&scene);
        self.tweens = tweens_for(&scene);
        self.field_of_view = scene
            .field_of_view
            .map(|f| ExponentialApproach::new(f.from, f.to, f.rate));
        self.noise = scene.noise;
        self.bounds = scene.container.bounds();
        self.slot = scene.noise_slot;
        self.published = None;
        self.build_failed = false;
    }

    /// Starts the camera path and every tween. Returns whether the path
    /// started.
    pub fn trigger(&mut self) -> bool {
        for named in &mut self.tweens {
            named.tween.trigger();
        }
        if let Some(fov) = &mut self.field_of_view {
            fov.trigger();
        }
        match self.navigator.trigger() {
            Ok(()) => true,
            Err(err) => {
                warn!("trigger ignored: {err}");
                false
            }
        }
    }

    /// Advances one frame. Returns the camera pose if the path is moving.
    pub fn tick(&mut self, dt: f32) -> Option<Pose> {
        self.refresh_volume();

        for named in &mut self.tweens {
            if let Some(value) = named.tween.tick(dt) {
                self.sink.set_float(&named.name, value);
            }
        }
        if let Some(fov) = &mut self.field_of_view {
            self.sink.set_float(FIELD_OF_VIEW, fov.tick(dt));
        }

        let pose = self.navigator.tick(dt);
        if let Some(pose) = &pose {
            publish_pose(&mut self.sink, pose);
        }
        pose
    }

    /// Binds the volume when it changes. A failed build is not retried until
    /// the scene is reloaded.
    fn refresh_volume(&mut self) {
        let Some(params) = self.noise else {
            return;
        };
        if self.build_failed {
            return;
        }
        match self.cache.ensure_current(&params) {
            Ok(texture) if self.published == Some(texture.handle()) => {}
            Ok(texture) => {
                let handle = texture.handle();
                debug!(?handle, "publishing volume");
                publish_volume(&mut self.sink, &self.slot, Ok(texture), self.bounds);
                self.published = Some(handle);
            }
            Err(err) => {
                publish_volume(&mut self.sink, &self.slot, Err(err), self.bounds);
                self.published = None;
                self.build_failed = true;
            }
        }
    }

    /// Releases the live volume.
    ///
    /// # Errors
    ///
    /// Propagates a failed release from the device.
    pub fn shutdown(&mut self) -> Result<(), ComputeError> {
        self.published = None;
        self.cache.release()
    }

    #[must_use]
    pub fn navigator(&self) -> &PathNavigator {
        &self.navigator
    }

    /// Volumes built over the app's lifetime, across scene reloads.
    #[must_use]
    pub fn volume_builds(&self) -> u64 {
        self.retired_builds + self.cache.builds()
    }

    #[must_use]
    pub fn cache(&self) -> &NoiseFieldCache {
        &self.cache
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Settings for a headless [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub scene: PathBuf,
    pub frames: u64,
    pub dt: f32,
    /// Frames on which the trigger fires.
    pub trigger_frames: Vec<u64>,
    pub watch: bool,
    pub prefer_gpu: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub poses: u64,
    pub volume_builds: u64,
    pub last_pose: Option<Pose>,
}

fn reload(app: &mut App<LoggingSink>, watcher: &SceneWatcher) {
    match SceneConfig::load(watcher.path()) {
        Ok(scene) => app.apply_scene(scene),
        Err(e) => error!("Keeping previous scene: {e:?}"),
    }
}

/// Runs the scene for `options.frames` ticks of `options.dt` seconds.
///
/// # Errors
///
/// Returns an error if the scene cannot be loaded or the volume cannot be
/// released at the end of the run.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let scene = SceneConfig::load(&options.scene)?;
    let device = compute::default_device(options.prefer_gpu);
    let mut app = App::new(scene, device, LoggingSink::default());

    let watcher = if options.watch {
        match SceneWatcher::start(&options.scene) {
            Ok(watcher) => {
                info!("Scene watcher started successfully.");
                Some(watcher)
            }
            Err(e) => {
                error!("Failed to start scene watcher: {e:?}");
                None
            }
        }
    } else {
        None
    };

    info!(frames = options.frames, dt = options.dt, "Starting frame loop...");
    let mut summary = RunSummary::default();
    for frame in 0..options.frames {
        if let Some(watcher) = &watcher {
            if watcher.take_change() {
                reload(&mut app, watcher);
            }
        }
        if options.trigger_frames.contains(&frame) {
            info!(frame, "trigger");
            app.trigger();
        }
        if let Some(pose) = app.tick(options.dt) {
            summary.poses += 1;
            summary.last_pose = Some(pose);
        }
        summary.frames += 1;

        if frame % LOG_INTERVAL == 0 {
            info!(
                "Frame {frame}: moving={}, traveled={:.2}/{:.2}",
                app.navigator().is_moving(),
                app.navigator().state().traveled,
                app.navigator().total()
            );
        }
    }

    summary.volume_builds = app.volume_builds();
    app.shutdown().context("Failed to release noise volume")?;
    info!(
        poses = summary.poses,
        builds = summary.volume_builds,
        "Frame loop finished."
    );
    Ok(summary)
}
