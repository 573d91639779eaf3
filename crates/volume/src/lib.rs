#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]
//! # Procedural noise volumes
//!
//! Builds 3D density fields on a [`compute::ComputeDevice`] and manages their
//! lifetime.
//!
//! -   [`NoiseParams`] describe a field and compare by value.
//! -   [`NoiseFieldBuilder`] turns params into a [`VolumeTexture`]: dispatch
//!     over a `ceil(resolution / 8)` grid, then an optional mip chain.
//! -   [`NoiseFieldCache`] rebuilds only when the params change and keeps a
//!     single live volume.
//! -   [`ParameterBindingSink`] is the renderer's side of the hand-off.
//!     [`publish_volume`] binds a build result or, on failure, unbinds the
//!     slot so the frame renders without a volume.

pub mod binding;
pub mod builder;
pub mod cache;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod texture;

pub use binding::{
    publish_bounds, publish_volume, ParameterBindingSink, VolumeBounds, CLOUD_NOISE_SLOT,
    DISK_NOISE_SLOT,
};
pub use builder::NoiseFieldBuilder;
pub use cache::NoiseFieldCache;
pub use dispatch::{dispatch_grid, groups_for_axis};
pub use error::VolumeError;
pub use params::NoiseParams;
pub use texture::{AddressMode, FilterMode, SamplerSettings, VolumeTexture};
