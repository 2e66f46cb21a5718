//! Construction and mutation errors.

use crate::{broad::door::DoorId, Fp};
use thiserror::Error;

/// Rejected shape geometry.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ShapeError {
    /// A polygon needs at least three vertices.
    #[error("polygon has {0} vertices, at least 3 are required")]
    TooFewVertices(usize),
    /// Two consecutive polygon vertices coincide.
    #[error("polygon side {0} has zero length")]
    DegenerateSide(usize),
    /// A vertex lies outside the half-plane of a side: concave or counter-clockwise.
    #[error("polygon is not convex and wound clockwise (vertex {vertex} is outside side {side})")]
    NotConvexClockwise { side: usize, vertex: usize },
    /// Circle radius must be positive and finite.
    #[error("invalid circle radius {0}")]
    InvalidRadius(Fp),
    /// Box minimum exceeds its maximum on some axis.
    #[error("box extents are inverted")]
    InvertedExtents,
}

/// Rejected world construction or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Coordinates outside the grid.
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },
    /// The number of cell codes does not match the grid dimensions.
    #[error("expected {expected} cell codes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// A per-cell type code has no corresponding cell type.
    #[error("unknown cell type code {0}")]
    UnknownCellCode(u8),
    /// The grid must have at least one cell.
    #[error("grid dimensions must be positive")]
    EmptyGrid,
    /// No door has been registered under this id.
    #[error("no door registered as {0:?}")]
    UnknownDoor(DoorId),
}
