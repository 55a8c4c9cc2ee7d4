//! Error types for crack insertion with machine-readable codes.
//!
//! Each error carries a unique code in the format `CRACK-XXXX`:
//! - `CRACK-1xxx`: input validation errors (mesh structure, coordinates)
//! - `CRACK-2xxx`: group topology errors (non-manifold crack group)
//! - `CRACK-3xxx`: internal consistency errors (algorithm invariants)
//!
//! Failures are never transient: the algorithms are pure functions of
//! their mesh inputs, so an error indicates malformed input or a genuine
//! bug, and retrying is never meaningful.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for crack insertion operations.
pub type CrackResult<T> = Result<T, CrackError>;

/// Machine-readable error codes for crack insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// CRACK-1001: cell references a node outside the coordinate array
    InvalidNodeIndex = 1001,
    /// CRACK-1002: cell has the wrong number of nodes for its type
    MalformedCell = 1002,
    /// CRACK-1003: cells of differing topological dimension in one mesh
    MixedCellDimension = 1003,
    /// CRACK-1004: group does not live on the parent mesh coordinates
    CoordsMismatch = 1004,
    /// CRACK-1005: group dimension is not one below the mesh dimension
    GroupDimension = 1005,

    /// CRACK-2001: group boundary element shared by more than two group cells
    NonManifoldGroup = 2001,

    /// CRACK-3001: algorithm invariant violated
    InternalInconsistency = 3001,
}

impl ErrorCode {
    /// The `CRACK-XXXX` string form of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidNodeIndex => "CRACK-1001",
            ErrorCode::MalformedCell => "CRACK-1002",
            ErrorCode::MixedCellDimension => "CRACK-1003",
            ErrorCode::CoordsMismatch => "CRACK-1004",
            ErrorCode::GroupDimension => "CRACK-1005",
            ErrorCode::NonManifoldGroup => "CRACK-2001",
            ErrorCode::InternalInconsistency => "CRACK-3001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the crack insertion core.
#[derive(Debug, Error, Diagnostic)]
pub enum CrackError {
    /// A cell references a node id outside the coordinate array.
    #[error("cell {cell} references node {node} but the mesh has {node_count} nodes")]
    #[diagnostic(
        code(mesh_crack::invalid_node_index),
        help("check the connectivity of cell {cell}; node ids must be < {node_count}")
    )]
    InvalidNodeIndex {
        /// Offending cell id.
        cell: u32,
        /// Out-of-range node id.
        node: u32,
        /// Size of the coordinate array.
        node_count: usize,
    },

    /// A cell carries the wrong number of nodes for its geometric type.
    #[error("cell {cell} has {found} nodes, expected {expected}")]
    #[diagnostic(code(mesh_crack::malformed_cell))]
    MalformedCell {
        /// Offending cell id.
        cell: u32,
        /// Node count required by the cell type (minimum for polygons).
        expected: usize,
        /// Node count actually found.
        found: usize,
    },

    /// A mesh mixes cells of different topological dimensions.
    #[error("cell {cell} has dimension {found}, mesh dimension is {expected}")]
    #[diagnostic(
        code(mesh_crack::mixed_cell_dimension),
        help("split the mesh by dimension before building the crack")
    )]
    MixedCellDimension {
        /// Offending cell id.
        cell: u32,
        /// Dimension of the mesh (its first cell).
        expected: u8,
        /// Dimension of the offending cell.
        found: u8,
    },

    /// The crack group does not share the parent mesh coordinate array.
    #[error("crack group does not share the parent mesh coordinate array")]
    #[diagnostic(
        code(mesh_crack::coords_mismatch),
        help("build the group with Mesh::new(parent.coords().clone()) or Mesh::subset")
    )]
    CoordsMismatch,

    /// The crack group is not of codimension 1 with respect to the mesh.
    #[error("crack group has dimension {group_dim} in a mesh of dimension {mesh_dim}, expected codimension 1")]
    #[diagnostic(code(mesh_crack::group_dimension))]
    GroupDimension {
        /// Dimension of the parent mesh.
        mesh_dim: u8,
        /// Dimension of the group.
        group_dim: u8,
    },

    /// A boundary element of the crack group is shared by more than two
    /// group cells, so the group is not a manifold surface/line.
    #[error(
        "crack group is non-manifold: boundary element {element} is shared by {cell_count} group cells"
    )]
    #[diagnostic(
        code(mesh_crack::non_manifold_group),
        help("every codimension-2 element of the group may be shared by at most 2 group cells")
    )]
    NonManifoldGroup {
        /// Id of the offending element in the group descending connectivity.
        element: u32,
        /// Number of group cells sharing it.
        cell_count: usize,
    },

    /// An internal invariant of the classification algorithm was violated.
    #[error("internal inconsistency during crack cell classification: {detail}")]
    #[diagnostic(
        code(mesh_crack::internal_inconsistency),
        help("this indicates malformed input or a bug; please report the offending mesh")
    )]
    InternalInconsistency {
        /// Human-readable description of the violated invariant.
        detail: String,
    },
}

impl CrackError {
    /// The machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CrackError::InvalidNodeIndex { .. } => ErrorCode::InvalidNodeIndex,
            CrackError::MalformedCell { .. } => ErrorCode::MalformedCell,
            CrackError::MixedCellDimension { .. } => ErrorCode::MixedCellDimension,
            CrackError::CoordsMismatch => ErrorCode::CoordsMismatch,
            CrackError::GroupDimension { .. } => ErrorCode::GroupDimension,
            CrackError::NonManifoldGroup { .. } => ErrorCode::NonManifoldGroup,
            CrackError::InternalInconsistency { .. } => ErrorCode::InternalInconsistency,
        }
    }

    pub(crate) fn inconsistency(detail: impl Into<String>) -> Self {
        CrackError::InternalInconsistency {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = CrackError::NonManifoldGroup {
            element: 3,
            cell_count: 4,
        };
        assert_eq!(err.code(), ErrorCode::NonManifoldGroup);
        assert_eq!(err.code().as_str(), "CRACK-2001");
    }

    #[test]
    fn messages_carry_context() {
        let err = CrackError::InvalidNodeIndex {
            cell: 7,
            node: 42,
            node_count: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("cell 7"));
        assert!(msg.contains("node 42"));
    }
}
