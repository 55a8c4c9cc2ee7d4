//! Crack (inner discontinuity) insertion core for unstructured meshes.
//!
//! This crate decides how to open a crack inside an unstructured 2D or 3D
//! mesh along a user-supplied group of lower-dimensional cells (segments
//! splitting a surface mesh, faces splitting a volume mesh). It answers
//! the two questions any crack insertion pipeline has to settle before
//! touching arrays:
//!
//! - **Which nodes split?** [`find_nodes_to_duplicate`] classifies the
//!   group nodes: interior nodes split, crack tips stay welded, and the
//!   3D corner cases (crack surface meeting the outer skin, singular
//!   points) are handled.
//! - **Which cells move to the new nodes?** [`find_cells_to_renumber`]
//!   partitions the cells around the crack into the two sides, flooding
//!   each side with the crack faces removed from the adjacency.
//!
//! Performing the actual node cloning and connectivity rewrite is left to
//! the caller; this crate is pure classification and never mutates its
//! inputs.
//!
//! # Mesh Model
//!
//! A [`Mesh`] is a reference-counted coordinate array plus cells of
//! uniform topological dimension. The crack group must be built on the
//! *same* coordinate array as the parent mesh (share the `Arc`), which is
//! what makes node-id based face matching exact — no geometric tolerance
//! is involved anywhere.
//!
//! Supported cell types are linear only: segments, triangles,
//! quadrangles, polygons, tetrahedra, pyramids, prisms, hexahedra.
//!
//! # Quick Start
//!
//! ```
//! use mesh_crack::{find_cells_to_renumber, find_nodes_to_duplicate, CellType, Mesh};
//!
//! // 2x2 grid of quads on a 3x3 lattice.
//! let mut coords = Vec::new();
//! for y in 0..3 {
//!     for x in 0..3 {
//!         coords.push([x as f64, y as f64, 0.0]);
//!     }
//! }
//! let mut m0 = Mesh::from_coords(coords);
//! for cy in 0..2u32 {
//!     for cx in 0..2u32 {
//!         let n0 = 3 * cy + cx;
//!         m0.add_cell(CellType::Quad4, &[n0, n0 + 1, n0 + 4, n0 + 3]);
//!     }
//! }
//!
//! // Crack along the middle column of edges.
//! let mut group = Mesh::new(m0.coords().clone());
//! group.add_cell(CellType::Seg2, &[1, 4]);
//! group.add_cell(CellType::Seg2, &[4, 7]);
//!
//! let dupl = find_nodes_to_duplicate(&m0, &group).unwrap();
//! assert_eq!(dupl, vec![1, 4, 7]);
//!
//! let partition = find_cells_to_renumber(&m0, &group, &dupl).unwrap();
//! println!("{partition}");
//! assert_eq!(partition.zone_count, 1);
//! assert_eq!(
//!     partition.cells_to_renumber.len() + partition.cells_untouched.len(),
//!     4
//! );
//! ```
//!
//! # Error Handling
//!
//! Operations return [`CrackResult<T>`], which is `Result<T, CrackError>`.
//! Every error carries a stable machine-readable code (`CRACK-1xxx`
//! input validation, `CRACK-2xxx` group topology, `CRACK-3xxx` internal
//! consistency) and a `miette` diagnostic with a help text.
//!
//! ```
//! use mesh_crack::{find_nodes_to_duplicate, CellType, CrackError, Mesh};
//!
//! let mut m0 = Mesh::from_coords(vec![
//!     [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
//! ]);
//! m0.add_cell(CellType::Quad4, &[0, 1, 2, 3]);
//!
//! // A group that does not share the parent coordinates is rejected.
//! let mut group = Mesh::from_coords(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
//! group.add_cell(CellType::Seg2, &[0, 1]);
//! assert!(matches!(
//!     find_nodes_to_duplicate(&m0, &group),
//!     Err(CrackError::CoordsMismatch)
//! ));
//! ```
//!
//! # Determinism
//!
//! All public outputs are sorted cell/node id lists; given the same
//! meshes the same partition comes back every time. Which of the two
//! sides of a zone lands in `cells_to_renumber` is arbitrary but stable.

mod adjacency;
mod classify;
mod connectivity;
mod duplicate;
mod error;
pub mod tracing_ext;
mod types;

// Re-export core types at crate root
pub use classify::{find_cells_to_renumber, CellPartition, Side};
pub use duplicate::find_nodes_to_duplicate;
pub use error::{CrackError, CrackResult, ErrorCode};
pub use types::{Cell, CellType, Mesh};

// Support primitives, public for callers building their own topology
// queries on the same mesh model.
pub use adjacency::CellAdjacency;
pub use connectivity::{
    boundary_nodes, cells_touching_nodes, find_cells_in, DescendingConnectivity,
};
