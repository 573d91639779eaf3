//! Scene files: the camera path, its playback settings and the noise volume
//! the effect samples.

use anyhow::{Context, Result};
use glam::Vec3;
use navigation::{Curve, PathTiming};
use serde::Deserialize;
use std::path::Path;
use volume::{NoiseParams, VolumeBounds, DISK_NOISE_SLOT};

fn default_speed() -> f32 {
    5.0
}

fn default_slot() -> String {
    DISK_NOISE_SLOT.to_string()
}

fn default_rate() -> f32 {
    1.0
}

/// A named effect parameter eased through `targets` on every trigger.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TweenConfig {
    pub name: String,
    #[serde(default)]
    pub initial: f32,
    pub targets: Vec<f32>,
    #[serde(default = "default_rate")]
    pub rate: f32,
}

/// Field of view that relaxes from `from` towards `to` after a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FieldOfViewConfig {
    pub from: f32,
    pub to: f32,
    #[serde(default = "default_rate")]
    pub rate: f32,
}

/// Transform of the box the volume is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Container {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Container {
    #[must_use]
    pub fn bounds(&self) -> VolumeBounds {
        VolumeBounds::from_container(self.position, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneConfig {
    pub path: Curve,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub timing: PathTiming,
    /// Keep the camera aimed at this point while moving.
    #[serde(default)]
    pub look_at: Option<Vec3>,
    /// Omit to run without a volume.
    #[serde(default)]
    pub noise: Option<NoiseParams>,
    #[serde(default = "default_slot")]
    pub noise_slot: String,
    #[serde(default)]
    pub generate_mips: bool,
    #[serde(default)]
    pub container: Container,
    #[serde(default)]
    pub tweens: Vec<TweenConfig>,
    #[serde(default)]
    pub field_of_view: Option<FieldOfViewConfig>,
}

impl SceneConfig {
    /// # Errors
    ///
    /// Fails if the text is not a valid scene.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse scene")
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid scene file {}", path.display()))
    }
}
