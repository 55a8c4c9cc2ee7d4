//! Node duplication classifier.
//!
//! Given a parent mesh and a crack group of codimension 1 living on the
//! same coordinates, decide which group nodes must be duplicated to open
//! the crack. The rules:
//!
//! - interior group nodes are always duplicated;
//! - nodes on the boundary of the group stay welded (they are the crack
//!   tip), *unless* they also lie on the skin of the parent mesh, in
//!   which case the crack runs out of the mesh there and the node splits;
//! - in 3D, a skin node on the line where the crack surface meets the
//!   parent skin is still a tip when it is the endpoint of that line, or
//!   when it is a singular point used by a cell that shares no face with
//!   the group (duplicating it would drag unrelated cells apart).

use hashbrown::HashSet;
use tracing::{debug, info};

use crate::connectivity::{
    boundary_nodes, cells_touching_nodes, find_cells_in, DescendingConnectivity,
};
use crate::error::{CrackError, CrackResult};
use crate::tracing_ext::OperationTimer;
use crate::types::Mesh;

/// Shared entry validation for the two crack operations.
pub(crate) fn validate_inputs(m0: &Mesh, group: &Mesh) -> CrackResult<()> {
    m0.validate()?;
    group.validate()?;
    if !group.shares_coords_with(m0) {
        return Err(CrackError::CoordsMismatch);
    }
    if let (Some(mesh_dim), Some(group_dim)) = (m0.dimension(), group.dimension()) {
        if mesh_dim == 0 || group_dim != mesh_dim - 1 {
            return Err(CrackError::GroupDimension {
                mesh_dim,
                group_dim,
            });
        }
    }
    Ok(())
}

/// Reject groups whose codimension-2 elements are shared by more than two
/// group cells: such a group branches and does not describe a two-sided
/// crack.
fn check_manifold_group(group_desc: &DescendingConnectivity) -> CrackResult<()> {
    for (element, cells) in group_desc.sub_to_cells.iter().enumerate() {
        if cells.len() > 2 {
            return Err(CrackError::NonManifoldGroup {
                element: element as u32,
                cell_count: cells.len(),
            });
        }
    }
    Ok(())
}

/// Compute the group nodes to duplicate in order to open a crack along
/// `group` inside `m0`.
///
/// `group` must be a mesh of dimension one below `m0`, sharing its
/// coordinate array. The result is sorted.
///
/// # Errors
///
/// - [`CrackError::NonManifoldGroup`] when a boundary element of the
///   group is shared by more than two group cells.
/// - Validation errors when either mesh is malformed or the two meshes
///   do not share coordinates.
///
/// # Example
///
/// ```
/// use mesh_crack::{find_nodes_to_duplicate, CellType, Mesh};
///
/// // 2x2 grid of quads on a 3x3 lattice, cracked along the middle column.
/// let mut coords = Vec::new();
/// for y in 0..3 {
///     for x in 0..3 {
///         coords.push([x as f64, y as f64, 0.0]);
///     }
/// }
/// let mut m0 = Mesh::from_coords(coords);
/// for cy in 0..2u32 {
///     for cx in 0..2u32 {
///         let n0 = 3 * cy + cx;
///         m0.add_cell(CellType::Quad4, &[n0, n0 + 1, n0 + 4, n0 + 3]);
///     }
/// }
/// let mut group = Mesh::new(m0.coords().clone());
/// group.add_cell(CellType::Seg2, &[1, 4]);
/// group.add_cell(CellType::Seg2, &[4, 7]);
///
/// // The crack crosses the whole mesh: every group node splits.
/// let dupl = find_nodes_to_duplicate(&m0, &group).unwrap();
/// assert_eq!(dupl, vec![1, 4, 7]);
/// ```
pub fn find_nodes_to_duplicate(m0: &Mesh, group: &Mesh) -> CrackResult<Vec<u32>> {
    validate_inputs(m0, group)?;
    if group.cell_count() == 0 {
        return Ok(Vec::new());
    }
    let _timer =
        OperationTimer::with_context("find_nodes_to_duplicate", m0.cell_count(), m0.node_count());

    // Boundary elements of the group: points of a 1D group, segments of a
    // 2D group. More than two group cells on one element means branching.
    let group_desc = DescendingConnectivity::build(group);
    check_manifold_group(&group_desc)?;

    // Nodes of the count-1 boundary elements of the group. These are the
    // crack tip candidates: welded unless the parent skin says otherwise.
    let tip_elements: Vec<u32> = group_desc
        .sub_to_cells
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.len() == 1)
        .map(|(id, _)| id as u32)
        .collect();
    let tip_nodes: HashSet<u32> = group_desc
        .sub_mesh
        .subset(&tip_elements)
        .node_ids()
        .into_iter()
        .collect();

    // Skin nodes of the parent mesh need duplication: a crack reaching the
    // outer surface opens all the way through it.
    let m0_desc = DescendingConnectivity::build(m0);
    let (skin, _) = m0_desc.skin();
    let mut splitting_skin_nodes: HashSet<u32> = skin.node_ids().into_iter().collect();

    // In 3D a skin node is not always splitting. Think of a partial plane
    // crack in a cube: the tip of the crack may lie on the skin of the
    // cube without the crack actually opening there.
    if m0.dimension() == Some(3) {
        refine_skin_nodes_3d(m0, group, &group_desc, &skin, &mut splitting_skin_nodes);
    }

    // A group node stays welded when it is a tip candidate not rescued by
    // the skin; everything else splits.
    let dupl: Vec<u32> = group
        .node_ids()
        .into_iter()
        .filter(|n| !tip_nodes.contains(n) || splitting_skin_nodes.contains(n))
        .collect();

    debug!(
        target: "mesh_crack::duplicate",
        group_nodes = group.node_ids().len(),
        duplicated = dupl.len(),
        "Node duplication classified"
    );
    Ok(dupl)
}

/// 3D refinement of the splitting skin-node set.
///
/// Where the boundary of the crack surface lies on the parent skin, the
/// two meet along a polyline (a U shape for a half-plane crack in a
/// cube). The endpoints of that polyline are true crack tips even though
/// they sit on the skin, and so are its singular points: nodes used by a
/// cell which has no face on the group.
fn refine_skin_nodes_3d(
    m0: &Mesh,
    group: &Mesh,
    group_desc: &DescendingConnectivity,
    skin: &Mesh,
    splitting_skin_nodes: &mut HashSet<u32>,
) {
    // Segments lying on both the skin of the parent mesh and the boundary
    // of the group.
    let skin_desc = DescendingConnectivity::build(skin);
    let matches = find_cells_in(&group_desc.sub_mesh, &skin_desc.sub_mesh);
    let shared_ids: Vec<u32> = matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_some())
        .map(|(id, _)| id as u32)
        .collect();
    if shared_ids.is_empty() {
        return;
    }
    let crack_skin_line = skin_desc.sub_mesh.subset(&shared_ids);

    // Endpoints of the line are crack tips: they do not split.
    for node in boundary_nodes(&crack_skin_line) {
        splitting_skin_nodes.remove(&node);
    }

    // Singular point logic. Only worth running when some node of the group
    // boundary carries more than 3 segments; a node on the crack/skin line
    // used by a cell which shares no face with the group must stay welded,
    // or that cell would be split apart too.
    let edge_desc = DescendingConnectivity::build(&group_desc.sub_mesh);
    let has_singular_candidate = edge_desc.sub_to_cells.iter().any(|cells| cells.len() > 3);
    if !has_singular_candidate {
        return;
    }
    info!(target: "mesh_crack::duplicate", "Hitting singular point logic");

    let line_nodes: HashSet<u32> = crack_skin_line.node_ids().into_iter().collect();
    let around_ids = cells_touching_nodes(m0, &line_nodes, false);
    let m_around = m0.subset(&around_ids);
    let around_desc = DescendingConnectivity::build(&m_around);

    // Cells of the neighbourhood having a complete face on the group.
    let face_matches = find_cells_in(&around_desc.sub_mesh, group);
    let mut cells_with_group_face: HashSet<u32> = HashSet::new();
    for face in face_matches.iter().flatten() {
        for &cell in &around_desc.sub_to_cells[*face as usize] {
            cells_with_group_face.insert(cell);
        }
    }

    // Nodes used by the remaining cells.
    let mut faceless_nodes: HashSet<u32> = HashSet::new();
    for (local, cell) in m_around.cells().enumerate() {
        if !cells_with_group_face.contains(&(local as u32)) {
            faceless_nodes.extend(cell.nodes.iter().copied());
        }
    }

    let mut singular: Vec<u32> = line_nodes.intersection(&faceless_nodes).copied().collect();
    singular.sort_unstable();
    debug!(
        target: "mesh_crack::duplicate",
        singular = ?singular,
        "Singular nodes kept welded"
    );
    for node in singular {
        splitting_skin_nodes.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellType;

    fn quad_grid_2x2() -> Mesh {
        let mut coords = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                coords.push([x as f64, y as f64, 0.0]);
            }
        }
        let mut mesh = Mesh::from_coords(coords);
        for cy in 0..2u32 {
            for cx in 0..2u32 {
                let n0 = 3 * cy + cx;
                mesh.add_cell(CellType::Quad4, &[n0, n0 + 1, n0 + 4, n0 + 3]);
            }
        }
        mesh
    }

    #[test]
    fn full_crossing_crack_duplicates_all_group_nodes() {
        let m0 = quad_grid_2x2();
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Seg2, &[1, 4]);
        group.add_cell(CellType::Seg2, &[4, 7]);
        let dupl = find_nodes_to_duplicate(&m0, &group).unwrap();
        assert_eq!(dupl, vec![1, 4, 7]);
    }

    #[test]
    fn interior_crack_keeps_tips_welded() {
        let m0 = quad_grid_2x2();
        // One interior segment: both its nodes are tips, node 4 is interior
        // to the mesh, node 1 is on the skin.
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Seg2, &[1, 4]);
        let dupl = find_nodes_to_duplicate(&m0, &group).unwrap();
        // Node 1 lies on the skin so it still splits; node 4 is a true tip.
        assert_eq!(dupl, vec![1]);
    }

    #[test]
    fn empty_group_duplicates_nothing() {
        let m0 = quad_grid_2x2();
        let group = Mesh::new(m0.coords().clone());
        assert!(find_nodes_to_duplicate(&m0, &group).unwrap().is_empty());
    }

    #[test]
    fn branching_group_is_rejected() {
        let m0 = quad_grid_2x2();
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Seg2, &[1, 4]);
        group.add_cell(CellType::Seg2, &[4, 7]);
        group.add_cell(CellType::Seg2, &[4, 3]);
        let err = find_nodes_to_duplicate(&m0, &group).unwrap_err();
        assert!(matches!(err, CrackError::NonManifoldGroup { cell_count: 3, .. }));
    }

    #[test]
    fn foreign_coordinates_are_rejected() {
        let m0 = quad_grid_2x2();
        let mut group = Mesh::from_coords(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ]);
        group.add_cell(CellType::Seg2, &[0, 1]);
        let err = find_nodes_to_duplicate(&m0, &group).unwrap_err();
        assert!(matches!(err, CrackError::CoordsMismatch));
    }

    #[test]
    fn wrong_group_dimension_is_rejected() {
        let m0 = quad_grid_2x2();
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Quad4, &[0, 1, 4, 3]);
        let err = find_nodes_to_duplicate(&m0, &group).unwrap_err();
        assert!(matches!(
            err,
            CrackError::GroupDimension {
                mesh_dim: 2,
                group_dim: 2
            }
        ));
    }
}
