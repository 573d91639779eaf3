use crate::VolumeError;
use compute::kernels::{MAX_OCTAVES, MAX_TILE_SIZE};
use compute::NoiseUniforms;
use serde::{Deserialize, Serialize};

/// Inputs of one noise volume. Two volumes built from equal params are
/// identical, so equality is what decides whether a rebuild is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub resolution: [u32; 3],
    /// Amplitude kept by each successive octave, in `[0, 1]`.
    pub scale: f32,
    pub boost: f32,
    pub octaves: u32,
    /// Lattice cells across the volume, at most `MAX_TILE_SIZE` once rounded.
    /// The field repeats horizontally with this period so it tiles without
    /// seams.
    pub tile_size: f32,
    pub swirl_strength: f32,
    pub vertical_scale: f32,
    pub max_radius: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            resolution: [128, 128, 128],
            scale: 0.5,
            boost: 1.0,
            octaves: 4,
            tile_size: 4.0,
            swirl_strength: 2.0,
            vertical_scale: 1.0,
            max_radius: 1.0,
        }
    }
}

impl NoiseParams {
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidParams`] describing the first bad field.
    pub fn validate(&self) -> Result<(), VolumeError> {
        if self.resolution.contains(&0) {
            return Err(VolumeError::InvalidParams(format!(
                "resolution {:?} has a zero axis",
                self.resolution
            )));
        }
        if !(1..=MAX_OCTAVES).contains(&self.octaves) {
            return Err(VolumeError::InvalidParams(format!(
                "octaves must be in 1..={MAX_OCTAVES}, got {}",
                self.octaves
            )));
        }
        let floats = [
            ("scale", self.scale),
            ("boost", self.boost),
            ("tile_size", self.tile_size),
            ("swirl_strength", self.swirl_strength),
            ("vertical_scale", self.vertical_scale),
            ("max_radius", self.max_radius),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(VolumeError::InvalidParams(format!(
                "{name} must be finite, got {value}"
            )));
        }
        if self.tile_size <= 0.0 {
            return Err(VolumeError::InvalidParams(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.tile_size.round() > MAX_TILE_SIZE as f32 {
            return Err(VolumeError::InvalidParams(format!(
                "tile_size must round to at most {MAX_TILE_SIZE}, got {}",
                self.tile_size
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_uniforms(&self) -> NoiseUniforms {
        NoiseUniforms {
            resolution: self.resolution,
            octaves: self.octaves,
            scale: self.scale,
            boost: self.boost,
            tile_size: self.tile_size,
            swirl_strength: self.swirl_strength,
            vertical_scale: self.vertical_scale,
            max_radius: self.max_radius,
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(NoiseParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_fields() {
        let bad = [
            NoiseParams {
                resolution: [64, 0, 64],
                ..NoiseParams::default()
            },
            NoiseParams {
                octaves: 0,
                ..NoiseParams::default()
            },
            NoiseParams {
                octaves: 11,
                ..NoiseParams::default()
            },
            NoiseParams {
                boost: f32::NAN,
                ..NoiseParams::default()
            },
            NoiseParams {
                tile_size: 0.0,
                ..NoiseParams::default()
            },
            NoiseParams {
                tile_size: 1e8,
                octaves: MAX_OCTAVES,
                ..NoiseParams::default()
            },
            NoiseParams {
                tile_size: MAX_TILE_SIZE as f32 + 1.0,
                ..NoiseParams::default()
            },
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(VolumeError::InvalidParams(_))),
                "{params:?} accepted"
            );
        }
    }

    #[test]
    fn largest_tile_size_is_accepted() {
        let params = NoiseParams {
            tile_size: MAX_TILE_SIZE as f32,
            octaves: MAX_OCTAVES,
            ..NoiseParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn partial_scene_entry_keeps_defaults() {
        let params: NoiseParams =
            serde_json::from_str(r#"{ "resolution": [32, 16, 32], "octaves": 6 }"#).unwrap();
        assert_eq!(params.resolution, [32, 16, 32]);
        assert_eq!(params.octaves, 6);
        assert_eq!(params.tile_size, NoiseParams::default().tile_size);
    }
}
