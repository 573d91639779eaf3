use compute::ComputeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeError {
    #[error("invalid noise parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl VolumeError {
    /// Whether the device simply cannot build volumes. Callers run without a
    /// volume in that case.
    #[must_use]
    pub fn is_capability(&self) -> bool {
        matches!(self, VolumeError::Compute(ComputeError::Capability(_)))
    }
}
