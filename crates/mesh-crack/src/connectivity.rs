//! Descending connectivity, skin extraction, and face matching.
//!
//! The descending connectivity of a mesh of dimension D is the mesh of
//! its (D-1)-dimensional sub-elements (faces of volumes, edges of faces,
//! points of segments), deduplicated by node set, together with the
//! incidence between cells and sub-elements in both directions.
//!
//! All matching in this module is purely topological: two elements are
//! the same if and only if they reference the same node-id set. This is
//! valid because every mesh involved in a crack insertion shares one
//! coordinate array.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::types::{Cell, CellType, Mesh};

/// Enumerate the (D-1)-dimensional boundary elements of a cell, in the
/// conventional order for its type.
fn sub_elements(cell: &Cell) -> Vec<(CellType, Vec<u32>)> {
    let n = &cell.nodes;
    let seg = |a: usize, b: usize| (CellType::Seg2, vec![n[a], n[b]]);
    let tri = |a: usize, b: usize, c: usize| (CellType::Tri3, vec![n[a], n[b], n[c]]);
    let quad =
        |a: usize, b: usize, c: usize, d: usize| (CellType::Quad4, vec![n[a], n[b], n[c], n[d]]);

    match cell.cell_type {
        CellType::Point1 => Vec::new(),
        CellType::Seg2 => vec![
            (CellType::Point1, vec![n[0]]),
            (CellType::Point1, vec![n[1]]),
        ],
        CellType::Tri3 => vec![seg(0, 1), seg(1, 2), seg(2, 0)],
        CellType::Quad4 => vec![seg(0, 1), seg(1, 2), seg(2, 3), seg(3, 0)],
        CellType::Polygon => {
            let len = n.len();
            (0..len)
                .map(|i| (CellType::Seg2, vec![n[i], n[(i + 1) % len]]))
                .collect()
        }
        CellType::Tetra4 => vec![tri(0, 2, 1), tri(0, 1, 3), tri(1, 2, 3), tri(2, 0, 3)],
        CellType::Pyra5 => vec![
            quad(0, 3, 2, 1),
            tri(0, 1, 4),
            tri(1, 2, 4),
            tri(2, 3, 4),
            tri(3, 0, 4),
        ],
        CellType::Penta6 => vec![
            tri(0, 2, 1),
            tri(3, 4, 5),
            quad(0, 1, 4, 3),
            quad(1, 2, 5, 4),
            quad(2, 0, 3, 5),
        ],
        CellType::Hexa8 => vec![
            quad(0, 1, 2, 3),
            quad(4, 7, 6, 5),
            quad(0, 4, 5, 1),
            quad(1, 5, 6, 2),
            quad(2, 6, 7, 3),
            quad(3, 7, 4, 0),
        ],
    }
}

/// Canonical key of an element: its sorted node-id set.
fn node_key(nodes: &[u32]) -> Vec<u32> {
    let mut key = nodes.to_vec();
    key.sort_unstable();
    key
}

/// Descending connectivity of a mesh.
#[derive(Debug)]
pub struct DescendingConnectivity {
    /// The (D-1)-dimensional sub-element mesh, on the parent coordinates.
    pub sub_mesh: Mesh,
    /// For each parent cell, the ids of its sub-elements.
    pub cell_to_subs: Vec<Vec<u32>>,
    /// For each sub-element, the ids of the parent cells sharing it.
    pub sub_to_cells: Vec<Vec<u32>>,
}

impl DescendingConnectivity {
    /// Build the descending connectivity of `mesh`.
    ///
    /// Sub-elements shared by several cells appear exactly once; identity
    /// is by node set.
    pub fn build(mesh: &Mesh) -> Self {
        let mut sub_mesh = Mesh::new(mesh.coords().clone());
        let mut seen: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut cell_to_subs: Vec<Vec<u32>> = Vec::with_capacity(mesh.cell_count());
        let mut sub_to_cells: Vec<Vec<u32>> = Vec::new();

        for (cell_id, cell) in mesh.cells().enumerate() {
            let cell_id = cell_id as u32;
            let subs = sub_elements(cell);
            let mut ids = Vec::with_capacity(subs.len());
            for (sub_type, sub_nodes) in subs {
                let sub_id = *seen.entry(node_key(&sub_nodes)).or_insert_with(|| {
                    let id = sub_mesh.cell_count() as u32;
                    sub_mesh.add_cell(sub_type, &sub_nodes);
                    sub_to_cells.push(Vec::new());
                    id
                });
                sub_to_cells[sub_id as usize].push(cell_id);
                ids.push(sub_id);
            }
            cell_to_subs.push(ids);
        }

        debug!(
            target: "mesh_crack::connectivity",
            cells = mesh.cell_count(),
            sub_elements = sub_mesh.cell_count(),
            "Built descending connectivity"
        );

        Self {
            sub_mesh,
            cell_to_subs,
            sub_to_cells,
        }
    }

    /// Ids of the sub-elements shared by exactly one parent cell.
    pub fn boundary_sub_ids(&self) -> Vec<u32> {
        self.sub_to_cells
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.len() == 1)
            .map(|(id, _)| id as u32)
            .collect()
    }

    /// The skin of the parent mesh: the sub-mesh of elements shared by
    /// exactly one cell, plus their ids in the descending mesh.
    pub fn skin(&self) -> (Mesh, Vec<u32>) {
        let ids = self.boundary_sub_ids();
        (self.sub_mesh.subset(&ids), ids)
    }
}

/// Node ids lying on the boundary of `mesh`: the fetched node ids of the
/// elements of its descending connectivity shared by exactly one cell.
pub fn boundary_nodes(mesh: &Mesh) -> Vec<u32> {
    let desc = DescendingConnectivity::build(mesh);
    let (skin, _) = desc.skin();
    skin.node_ids()
}

/// For each cell of `needles`, the id of the `haystack` cell made of the
/// identical node set, or `None` when there is no such cell.
///
/// This is the face-matching primitive of the crack algorithms: matching
/// a crack group cell against the faces of a descending connectivity, or
/// a skin edge against the boundary edges of the group.
pub fn find_cells_in(haystack: &Mesh, needles: &Mesh) -> Vec<Option<u32>> {
    let index: HashMap<Vec<u32>, u32> = haystack
        .cells()
        .enumerate()
        .map(|(id, cell)| (node_key(&cell.nodes), id as u32))
        .collect();
    needles
        .cells()
        .map(|cell| index.get(&node_key(&cell.nodes)).copied())
        .collect()
}

/// Ids of the cells of `mesh` touching the given nodes.
///
/// With `require_all` set, a cell qualifies only when *all* of its nodes
/// are in `nodes`; otherwise a single shared node suffices (the "lying on
/// nodes" query used to collect every cell around a crack, including
/// corner-touch-only ones). The result is sorted.
pub fn cells_touching_nodes(mesh: &Mesh, nodes: &HashSet<u32>, require_all: bool) -> Vec<u32> {
    mesh.cells()
        .enumerate()
        .filter(|(_, cell)| {
            if require_all {
                cell.nodes.iter().all(|n| nodes.contains(n))
            } else {
                cell.nodes.iter().any(|n| nodes.contains(n))
            }
        })
        .map(|(id, _)| id as u32)
        .collect()
}
