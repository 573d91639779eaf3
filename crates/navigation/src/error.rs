use crate::curve::CurveKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("{kind:?} path needs at least {required} control points, found {actual}")]
    InvalidPath {
        kind: CurveKind,
        required: usize,
        actual: usize,
    },
    #[error("path has zero length")]
    DegeneratePath,
}
