//! Core unstructured mesh data types.

use std::sync::Arc;

use hashbrown::HashSet;
use nalgebra::Point3;

use crate::error::{CrackError, CrackResult};

/// Geometric type of a mesh cell.
///
/// Only linear cell types are supported. Quadratic cells and general
/// polyhedra are out of scope for the crack insertion core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// A single node (0D).
    Point1,
    /// A two-node segment (1D).
    Seg2,
    /// A three-node triangle (2D).
    Tri3,
    /// A four-node quadrangle (2D).
    Quad4,
    /// An n-node planar polygon (2D).
    Polygon,
    /// A four-node tetrahedron (3D).
    Tetra4,
    /// A five-node pyramid with quadrangular base (3D).
    Pyra5,
    /// A six-node pentahedron (triangular prism, 3D).
    Penta6,
    /// An eight-node hexahedron (3D).
    Hexa8,
}

impl CellType {
    /// Topological dimension of cells of this type.
    #[inline]
    pub fn dimension(&self) -> u8 {
        match self {
            CellType::Point1 => 0,
            CellType::Seg2 => 1,
            CellType::Tri3 | CellType::Quad4 | CellType::Polygon => 2,
            CellType::Tetra4 | CellType::Pyra5 | CellType::Penta6 | CellType::Hexa8 => 3,
        }
    }

    /// Number of nodes for fixed-size types, `None` for `Polygon`.
    #[inline]
    pub fn node_count(&self) -> Option<usize> {
        match self {
            CellType::Point1 => Some(1),
            CellType::Seg2 => Some(2),
            CellType::Tri3 => Some(3),
            CellType::Quad4 => Some(4),
            CellType::Polygon => None,
            CellType::Tetra4 => Some(4),
            CellType::Pyra5 => Some(5),
            CellType::Penta6 => Some(6),
            CellType::Hexa8 => Some(8),
        }
    }
}

/// A single cell: a geometric type plus an ordered list of node ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Geometric type of the cell.
    pub cell_type: CellType,
    /// Node ids into the mesh coordinate array, in conventional order.
    pub nodes: Vec<u32>,
}

/// An unstructured mesh: a shared node coordinate array plus a list of
/// cells of uniform topological dimension.
///
/// The coordinate array is reference-counted so that several meshes can
/// share it. The crack insertion algorithms require the crack group to
/// live on the *same* coordinate array as the parent mesh; this is what
/// makes node-id based face matching valid.
///
/// # Example
///
/// ```
/// use mesh_crack::{CellType, Mesh};
///
/// // Two quads side by side sharing an edge.
/// let coords = vec![
///     [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [2.0, 1.0, 0.0],
/// ];
/// let mut mesh = Mesh::from_coords(coords);
/// mesh.add_cell(CellType::Quad4, &[0, 1, 4, 3]);
/// mesh.add_cell(CellType::Quad4, &[1, 2, 5, 4]);
///
/// assert_eq!(mesh.cell_count(), 2);
/// assert_eq!(mesh.dimension(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct Mesh {
    coords: Arc<[Point3<f64>]>,
    cells: Vec<Cell>,
}

impl Mesh {
    /// Create an empty mesh over an existing (possibly shared) coordinate array.
    pub fn new(coords: Arc<[Point3<f64>]>) -> Self {
        Self {
            coords,
            cells: Vec::new(),
        }
    }

    /// Create an empty mesh from raw coordinate triplets.
    pub fn from_coords(coords: Vec<[f64; 3]>) -> Self {
        let coords: Vec<Point3<f64>> = coords
            .into_iter()
            .map(|[x, y, z]| Point3::new(x, y, z))
            .collect();
        Self::new(coords.into())
    }

    /// The shared coordinate array.
    #[inline]
    pub fn coords(&self) -> &Arc<[Point3<f64>]> {
        &self.coords
    }

    /// Whether this mesh and `other` share the same coordinate array.
    #[inline]
    pub fn shares_coords_with(&self, other: &Mesh) -> bool {
        Arc::ptr_eq(&self.coords, &other.coords)
    }

    /// Number of nodes in the coordinate array.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    /// Number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Append a cell.
    pub fn add_cell(&mut self, cell_type: CellType, nodes: &[u32]) {
        self.cells.push(Cell {
            cell_type,
            nodes: nodes.to_vec(),
        });
    }

    /// Access a cell by id.
    #[inline]
    pub fn cell(&self, id: u32) -> &Cell {
        &self.cells[id as usize]
    }

    /// Iterate over all cells.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Topological dimension of the mesh: the common dimension of its
    /// cells, or `None` for an empty mesh.
    ///
    /// Meshes of mixed dimension are rejected by [`Mesh::validate`], so
    /// on validated meshes this is simply the dimension of the first cell.
    pub fn dimension(&self) -> Option<u8> {
        self.cells.first().map(|c| c.cell_type.dimension())
    }

    /// Extract the sub-mesh made of the given cells, on the same
    /// coordinate array. Node ids are *not* renumbered.
    pub fn subset(&self, cell_ids: &[u32]) -> Mesh {
        let cells = cell_ids
            .iter()
            .map(|&id| self.cells[id as usize].clone())
            .collect();
        Mesh {
            coords: Arc::clone(&self.coords),
            cells,
        }
    }

    /// Sorted, deduplicated list of node ids referenced by the cells of
    /// this mesh (the "fetched" node ids).
    pub fn node_ids(&self) -> Vec<u32> {
        let set: HashSet<u32> = self
            .cells
            .iter()
            .flat_map(|c| c.nodes.iter().copied())
            .collect();
        let mut ids: Vec<u32> = set.into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Check structural validity: node ids in range, expected node count
    /// per cell type, and uniform cell dimension.
    pub fn validate(&self) -> CrackResult<()> {
        let dim = self.dimension();
        for (id, cell) in self.cells.iter().enumerate() {
            let id = id as u32;
            if let Some(expected) = cell.cell_type.node_count() {
                if cell.nodes.len() != expected {
                    return Err(CrackError::MalformedCell {
                        cell: id,
                        expected,
                        found: cell.nodes.len(),
                    });
                }
            } else if cell.nodes.len() < 3 {
                return Err(CrackError::MalformedCell {
                    cell: id,
                    expected: 3,
                    found: cell.nodes.len(),
                });
            }
            for &node in &cell.nodes {
                if node as usize >= self.coords.len() {
                    return Err(CrackError::InvalidNodeIndex {
                        cell: id,
                        node,
                        node_count: self.coords.len(),
                    });
                }
            }
            if cell.cell_type.dimension() != dim.unwrap_or(0) {
                return Err(CrackError::MixedCellDimension {
                    cell: id,
                    expected: dim.unwrap_or(0),
                    found: cell.cell_type.dimension(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> Mesh {
        let mut mesh = Mesh::from_coords(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
        ]);
        mesh.add_cell(CellType::Quad4, &[0, 1, 4, 3]);
        mesh.add_cell(CellType::Quad4, &[1, 2, 5, 4]);
        mesh
    }

    #[test]
    fn dimension_and_counts() {
        let mesh = two_quads();
        assert_eq!(mesh.dimension(), Some(2));
        assert_eq!(mesh.cell_count(), 2);
        assert_eq!(mesh.node_count(), 6);
        mesh.validate().unwrap();
    }

    #[test]
    fn node_ids_are_sorted_and_unique() {
        let mesh = two_quads();
        assert_eq!(mesh.node_ids(), vec![0, 1, 2, 3, 4, 5]);
        let sub = mesh.subset(&[1]);
        assert_eq!(sub.node_ids(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn subset_shares_coords() {
        let mesh = two_quads();
        let sub = mesh.subset(&[0]);
        assert!(sub.shares_coords_with(&mesh));
        assert_eq!(sub.cell_count(), 1);
    }

    #[test]
    fn validate_rejects_out_of_range_node() {
        let mut mesh = two_quads();
        mesh.add_cell(CellType::Quad4, &[0, 1, 99, 3]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn validate_rejects_mixed_dimension() {
        let mut mesh = two_quads();
        mesh.add_cell(CellType::Seg2, &[0, 1]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn validate_rejects_wrong_node_count() {
        let mut mesh = two_quads();
        mesh.add_cell(CellType::Quad4, &[0, 1, 4]);
        assert!(mesh.validate().is_err());
    }
}
