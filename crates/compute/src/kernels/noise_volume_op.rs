use crate::{ComputeError, WORKGROUP_SIZE};

use super::{texel_count, texel_index};

/// Uniform block of `shaders/noise_volume.wgsl`. Field order and padding
/// follow WGSL uniform layout rules.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NoiseUniforms {
    pub resolution: [u32; 3],
    pub octaves: u32,
    pub scale: f32,
    pub boost: f32,
    pub tile_size: f32,
    pub swirl_strength: f32,
    pub vertical_scale: f32,
    pub max_radius: f32,
    pub _pad: [f32; 2],
}

pub const MAX_OCTAVES: u32 = 10;

/// Largest lattice period. The finest octave repeats every
/// `MAX_TILE_SIZE << (MAX_OCTAVES - 1)` cells, well inside `i32`.
pub const MAX_TILE_SIZE: i32 = 4096;

fn hash3(x: i32, y: i32, z: i32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h = (h ^ (h >> 13)).wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h & 0x00ff_ffff) as f32 / 16_777_216.0
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Trilinear value noise whose lattice wraps every `period` cells along x and z.
fn value_noise(p: [f32; 3], period: i32) -> f32 {
    let cell = p.map(f32::floor);
    let i = cell.map(|c| c as i32);
    let u = [fade(p[0] - cell[0]), fade(p[1] - cell[1]), fade(p[2] - cell[2])];

    let corner = |dx: i32, dy: i32, dz: i32| {
        hash3(
            i[0].wrapping_add(dx).rem_euclid(period),
            i[1].wrapping_add(dy),
            i[2].wrapping_add(dz).rem_euclid(period),
        )
    };

    let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), u[0]);
    let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), u[0]);
    let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), u[0]);
    let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), u[0]);
    let y0 = lerp(x00, x10, u[1]);
    let y1 = lerp(x01, x11, u[1]);
    lerp(y0, y1, u[2])
}

/// Density of texel `id`, in `[0, 1]`.
///
/// The texel centre is mapped to `[-1, 1]^3`. Horizontal coordinates are
/// swirled around the vertical axis (strongest at the centre, fading out at
/// `max_radius`), the vertical coordinate is stretched by `vertical_scale`,
/// and `octaves` layers of value noise are summed with amplitude falloff
/// `scale`. The result is boosted, then faded out radially past
/// `0.8 * max_radius` and vertically by `vertical_scale`.
#[must_use]
pub fn density(u: &NoiseUniforms, id: [u32; 3]) -> f32 {
    let res = u.resolution.map(|r| r.max(1) as f32);
    let c = [
        (id[0] as f32 + 0.5) / res[0] * 2.0 - 1.0,
        (id[1] as f32 + 0.5) / res[1] * 2.0 - 1.0,
        (id[2] as f32 + 0.5) / res[2] * 2.0 - 1.0,
    ];

    let max_radius = u.max_radius.max(1e-4);
    let radial = (c[0] * c[0] + c[2] * c[2]).sqrt();
    let angle = u.swirl_strength * (1.0 - (radial / max_radius).clamp(0.0, 1.0));
    let (s, co) = angle.sin_cos();
    let sx = c[0] * co - c[2] * s;
    let sz = c[0] * s + c[2] * co;

    let period = (u.tile_size.round() as i32).clamp(1, MAX_TILE_SIZE);
    let cells = period as f32;
    let base = [
        (sx * 0.5 + 0.5) * cells,
        (c[1] * u.vertical_scale * 0.5 + 0.5) * cells,
        (sz * 0.5 + 0.5) * cells,
    ];

    let persistence = u.scale.clamp(0.0, 1.0);
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut octave_period = period;
    for _ in 0..u.octaves.clamp(1, MAX_OCTAVES) {
        let p = base.map(|v| v * frequency);
        sum += value_noise(p, octave_period) * amplitude;
        norm += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
        octave_period *= 2;
    }
    let fbm = sum / norm;

    let radial_fade = 1.0 - smoothstep(0.8 * max_radius, max_radius, radial);
    let vertical_fade = (1.0 - c[1].abs() * u.vertical_scale).clamp(0.0, 1.0);
    (fbm * u.boost).clamp(0.0, 1.0) * radial_fade * vertical_fade
}

/// Fills `out` (mip level 0 of a volume of `size`) with noise density.
///
/// Invocations past the edge of the volume are skipped, so any grid at least
/// as large as `ceil(size / WORKGROUP_SIZE)` covers the whole volume.
///
/// # Errors
///
/// Returns `ComputeError::ShapeMismatch` if the uniform block or the output
/// slice do not match `size`.
pub fn handle_noise_volume(
    uniforms: &[u8],
    size: [u32; 3],
    out: &mut [f32],
    workgroups: [u32; 3],
) -> Result<(), ComputeError> {
    if uniforms.len() != std::mem::size_of::<NoiseUniforms>() {
        return Err(ComputeError::ShapeMismatch(
            "NoiseVolume expects a 48-byte uniform block",
        ));
    }
    let params: NoiseUniforms = bytemuck::pod_read_unaligned(uniforms);
    if params.resolution != size {
        return Err(ComputeError::ShapeMismatch(
            "NoiseVolume resolution does not match the target volume",
        ));
    }
    if out.len() != texel_count(size) {
        return Err(ComputeError::ShapeMismatch(
            "NoiseVolume output length does not match the target volume",
        ));
    }

    let threads = workgroups.map(|g| g.saturating_mul(WORKGROUP_SIZE));
    for z in 0..threads[2].min(size[2]) {
        for y in 0..threads[1].min(size[1]) {
            for x in 0..threads[0].min(size[0]) {
                out[texel_index(size, [x, y, z])] = density(&params, [x, y, z]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(resolution: [u32; 3]) -> NoiseUniforms {
        NoiseUniforms {
            resolution,
            octaves: 4,
            scale: 0.5,
            boost: 1.0,
            tile_size: 4.0,
            swirl_strength: 0.0,
            vertical_scale: 0.0,
            max_radius: 10.0,
            _pad: [0.0; 2],
        }
    }

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<NoiseUniforms>(), 48);
    }

    #[test]
    fn density_stays_in_unit_range() {
        let mut u = uniforms([8, 8, 8]);
        u.boost = 3.0;
        u.swirl_strength = 4.0;
        u.vertical_scale = 0.5;
        u.max_radius = 1.0;
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    let d = density(&u, [x, y, z]);
                    assert!((0.0..=1.0).contains(&d), "density {d} out of range");
                }
            }
        }
    }

    #[test]
    fn lattice_wraps_horizontally() {
        let period = 4;
        let a = value_noise([0.25, 1.5, 0.75], period);
        let b = value_noise([4.25, 1.5, 0.75], period);
        let c = value_noise([0.25, 1.5, 8.75], period);
        assert!((a - b).abs() < 1e-6);
        assert!((a - c).abs() < 1e-6);
    }

    #[test]
    fn density_vanishes_outside_max_radius() {
        let mut u = uniforms([16, 1, 16]);
        u.max_radius = 0.5;
        // Corner texel sits at radial distance ~1.3.
        assert_eq!(density(&u, [0, 0, 0]), 0.0);
    }

    #[test]
    fn partial_grid_leaves_tail_untouched() {
        let u = uniforms([10, 1, 1]);
        let mut out = vec![-1.0; 10];
        handle_noise_volume(bytemuck::bytes_of(&u), [10, 1, 1], &mut out, [1, 1, 1]).unwrap();
        assert!(out[..8].iter().all(|&d| d >= 0.0));
        assert!(out[8..].iter().all(|&d| d == -1.0));

        handle_noise_volume(bytemuck::bytes_of(&u), [10, 1, 1], &mut out, [2, 1, 1]).unwrap();
        assert!(out.iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn extreme_uniforms_stay_finite() {
        let mut u = uniforms([4, 4, 4]);
        u.tile_size = 1e8;
        u.octaves = MAX_OCTAVES;
        u.vertical_scale = 1e12;
        let mut out = vec![0.0; 64];
        handle_noise_volume(bytemuck::bytes_of(&u), [4, 4, 4], &mut out, [1, 1, 1]).unwrap();
        assert!(out.iter().all(|d| (0.0..=1.0).contains(d)));
    }

    #[test]
    fn mismatched_resolution_fails() {
        let u = uniforms([4, 4, 4]);
        let mut out = vec![0.0; 27];
        let result = handle_noise_volume(bytemuck::bytes_of(&u), [3, 3, 3], &mut out, [1, 1, 1]);
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
    }
}
