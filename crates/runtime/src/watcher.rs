//! # Scene hot-reloading
//!
//! Watches the scene file so path and noise settings can be edited while the
//! runtime is playing. The watcher runs on `notify`'s own thread and only
//! raises a flag; the frame loop decides when to reload.
//!
//! The parent directory is watched rather than the file itself, since most
//! editors save by replacing the file.

use anyhow::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Keeps the underlying watcher alive. Dropping it stops monitoring.
pub struct SceneWatcher {
    _watcher: RecommendedWatcher,
    changed: Arc<AtomicBool>,
    path: PathBuf,
}

impl SceneWatcher {
    /// Starts watching `scene`.
    ///
    /// # Errors
    ///
    /// Fails if the watcher cannot be created or the scene's directory cannot
    /// be watched.
    pub fn start(scene: &Path) -> Result<Self> {
        info!("Initializing scene watcher for {}", scene.display());

        let file_name = scene
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Scene path has no file name: {}", scene.display()))?
            .to_os_string();
        let changed = Arc::new(AtomicBool::new(false));
        let mut watcher = create_file_watcher(file_name, Arc::clone(&changed))?;
        start_watching_directory(&mut watcher, scene)?;

        Ok(Self {
            _watcher: watcher,
            changed,
            path: scene.to_path_buf(),
        })
    }

    /// Whether the scene changed since the last call. Clears the flag.
    #[must_use]
    pub fn take_change(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn create_file_watcher(file_name: OsString, changed: Arc<AtomicBool>) -> Result<RecommendedWatcher> {
    notify::recommended_watcher(move |result: notify::Result<Event>| {
        handle_file_event(result, &file_name, &changed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {e}"))
}

fn start_watching_directory(watcher: &mut RecommendedWatcher, scene: &Path) -> Result<()> {
    let directory = match scene.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !directory.exists() {
        error!("Scene directory '{}' not found", directory.display());
        return Err(anyhow::anyhow!("Scene directory not found"));
    }
    watcher
        .watch(directory, RecursiveMode::NonRecursive)
        .map_err(|e| anyhow::anyhow!("Failed to watch scene directory: {e}"))
}

fn handle_file_event(result: notify::Result<Event>, file_name: &OsStr, changed: &AtomicBool) {
    match result {
        Ok(event) => {
            if is_scene_change(&event, file_name) {
                info!("Scene file modified: {:?}", file_name);
                changed.store(true, Ordering::Release);
            }
        }
        Err(e) => error!("File watcher error: {e:?}"),
    }
}

fn is_scene_change(event: &Event, file_name: &OsStr) -> bool {
    if !event.kind.is_modify() && !event.kind.is_create() {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name().is_some_and(|name| name == file_name))
}
