//! Cell side classifier.
//!
//! Once the nodes to duplicate are known, every parent cell touching them
//! must be assigned to one side of the crack: cells on side A get their
//! connectivity renumbered onto the cloned nodes, cells on side B keep
//! the original ids. The assignment floods the cells having a complete
//! face on the group, with the crack faces removed from the adjacency so
//! the flood cannot cross the crack, and bounces to the other side
//! through the face-partner pairs. Cells touching the duplicated nodes
//! only through a node (corner contact) inherit a side from their settled
//! face neighbours afterwards.

use std::collections::VecDeque;
use std::fmt;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::adjacency::CellAdjacency;
use crate::connectivity::{cells_touching_nodes, find_cells_in, DescendingConnectivity};
use crate::duplicate::validate_inputs;
use crate::error::{CrackError, CrackResult};
use crate::tracing_ext::OperationTimer;
use crate::types::Mesh;

/// Side of the crack a cell lands on. Which concrete side is `A` in a
/// given zone is arbitrary; only the bipartition is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Cells whose connectivity is renumbered onto the cloned nodes.
    A,
    /// Cells keeping the original node ids.
    B,
}

impl Side {
    /// The other side of the crack.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Classification state of one cell during the flood.
///
/// `zone` numbers the independent cracks (connected parts of the group):
/// sides are only comparable within one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellLabel {
    /// Not reached yet.
    Unlabeled,
    /// Queued as a flood seed with a chosen side, not flooded yet.
    Provisional { side: Side, zone: u32 },
    /// Flooded: final side for a face-touching cell.
    Settled { side: Side, zone: u32 },
    /// Node-only-touch cell that copied the side of a settled neighbour.
    Inherited { side: Side, zone: u32 },
}

impl CellLabel {
    fn side_and_zone(self) -> Option<(Side, u32)> {
        match self {
            CellLabel::Unlabeled => None,
            CellLabel::Provisional { side, zone }
            | CellLabel::Settled { side, zone }
            | CellLabel::Inherited { side, zone } => Some((side, zone)),
        }
    }
}

/// Bipartition of the cells around a crack.
///
/// The two lists are disjoint, sorted, and together cover every parent
/// cell touching a duplicated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPartition {
    /// Cells to renumber onto the cloned nodes (side A of every zone).
    pub cells_to_renumber: Vec<u32>,
    /// Cells keeping the original connectivity (side B of every zone).
    pub cells_untouched: Vec<u32>,
    /// Number of independent cracks found.
    pub zone_count: u32,
}

impl fmt::Display for CellPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crack cell partition:")?;
        writeln!(f, "  Cells to renumber: {}", self.cells_to_renumber.len())?;
        writeln!(f, "  Cells untouched:   {}", self.cells_untouched.len())?;
        write!(f, "  Independent zones: {}", self.zone_count)
    }
}

/// Partition the cells of `m0` touching the duplicated nodes into the two
/// sides of the crack.
///
/// `dupl` is the output of [`find_nodes_to_duplicate`]; `group` is the
/// same crack group. Cells touching no duplicated node are absent from
/// the partition. Which side is "to renumber" is arbitrary per zone.
///
/// # Errors
///
/// Validation errors for malformed inputs, and
/// [`CrackError::InternalInconsistency`] when the flood cannot produce a
/// consistent two-sided assignment (a sign the crack group does not
/// separate the mesh cleanly).
///
/// [`find_nodes_to_duplicate`]: crate::find_nodes_to_duplicate
pub fn find_cells_to_renumber(m0: &Mesh, group: &Mesh, dupl: &[u32]) -> CrackResult<CellPartition> {
    validate_inputs(m0, group)?;
    let _timer =
        OperationTimer::with_context("find_cells_to_renumber", m0.cell_count(), m0.node_count());

    let dupl_set: HashSet<u32> = dupl.iter().copied().collect();
    // Every cell touching a duplicated node, even through a single corner.
    let large_ids = cells_touching_nodes(m0, &dupl_set, false);
    if large_ids.is_empty() {
        return Ok(CellPartition {
            cells_to_renumber: Vec::new(),
            cells_untouched: Vec::new(),
            zone_count: 0,
        });
    }
    let m_large = m0.subset(&large_ids);
    let large_desc = DescendingConnectivity::build(&m_large);

    // Cells with a complete face on the group, with the pairing between
    // the two cells flanking each crack face.
    let (strict_local, partner_of) = strict_cells_and_partners(&large_desc, group);
    let m_strict = m_large.subset(&strict_local);
    debug!(
        target: "mesh_crack::classify",
        large = large_ids.len(),
        strict = strict_local.len(),
        "Collected cells around the crack"
    );

    // Adjacency of the strict sub-mesh with the crack faces removed, so
    // the flood cannot leak to the other side.
    let strict_desc = DescendingConnectivity::build(&m_strict);
    let crack_faces: HashSet<u32> = find_cells_in(&strict_desc.sub_mesh, group)
        .into_iter()
        .flatten()
        .collect();
    let adjacency = CellAdjacency::build_without(&strict_desc, &crack_faces);

    let (strict_labels, zone_count) = flood_sides(&adjacency, &partner_of)?;

    // Project onto the large sub-mesh and let corner-contact cells inherit
    // a side from their settled face neighbours.
    let mut labels = vec![CellLabel::Unlabeled; large_ids.len()];
    for (strict_pos, &large_pos) in strict_local.iter().enumerate() {
        labels[large_pos as usize] = strict_labels[strict_pos];
    }
    let large_adjacency = CellAdjacency::build(&large_desc);
    inherit_from_neighbors(&mut labels, &large_adjacency);

    // Every cell around the crack must have ended up on a side.
    let mut cells_to_renumber = Vec::new();
    let mut cells_untouched = Vec::new();
    for (local, label) in labels.iter().enumerate() {
        let global = large_ids[local];
        match label.side_and_zone() {
            Some((Side::A, _)) => cells_to_renumber.push(global),
            Some((Side::B, _)) => cells_untouched.push(global),
            None => {
                return Err(CrackError::inconsistency(format!(
                    "cell {global} touching the crack was never assigned a side"
                )));
            }
        }
    }
    cells_to_renumber.sort_unstable();
    cells_untouched.sort_unstable();
    Ok(CellPartition {
        cells_to_renumber,
        cells_untouched,
        zone_count,
    })
}

/// Locate the cells of the large sub-mesh with a complete face on the
/// group, in discovery order, with the partner pairing across each crack
/// face (indices into the returned list).
fn strict_cells_and_partners(
    large_desc: &DescendingConnectivity,
    group: &Mesh,
) -> (Vec<u32>, HashMap<u32, u32>) {
    let matches = find_cells_in(&large_desc.sub_mesh, group);
    let mut strict_local: Vec<u32> = Vec::new();
    let mut strict_pos: HashMap<u32, u32> = HashMap::new();
    let mut partner_of: HashMap<u32, u32> = HashMap::new();
    let mut pos_of = |cell: u32, strict_local: &mut Vec<u32>| -> u32 {
        *strict_pos.entry(cell).or_insert_with(|| {
            strict_local.push(cell);
            (strict_local.len() - 1) as u32
        })
    };
    for face in matches.iter().flatten() {
        let parents = &large_desc.sub_to_cells[*face as usize];
        match parents[..] {
            [a, b] => {
                let pa = pos_of(a, &mut strict_local);
                let pb = pos_of(b, &mut strict_local);
                partner_of.insert(pa, pb);
                partner_of.insert(pb, pa);
            }
            // A crack face on the boundary of the sub-mesh has one cell
            // only; it is still face-touching, just unpaired.
            [a] => {
                pos_of(a, &mut strict_local);
            }
            _ => {}
        }
    }
    (strict_local, partner_of)
}

/// Flood the strict cells, zone by zone, bouncing sides across the
/// partner pairs.
///
/// Each unlabeled cell starts a new zone on side A. Flooding a seed
/// settles its whole connected component (crack faces are already removed
/// from `adjacency`) and enqueues the partner of every settled cell on
/// the opposite side. The iteration cap and the conflict checks guard the
/// invariant that partners always land on opposite sides of one zone.
fn flood_sides(
    adjacency: &CellAdjacency,
    partner_of: &HashMap<u32, u32>,
) -> CrackResult<(Vec<CellLabel>, u32)> {
    let n = adjacency.cell_count();
    let mut labels = vec![CellLabel::Unlabeled; n];
    let mut zone_count: u32 = 0;
    let mut floods = 0usize;
    let flood_cap = n + 1;

    for start in 0..n as u32 {
        if labels[start as usize] != CellLabel::Unlabeled {
            continue;
        }
        let zone = zone_count;
        zone_count += 1;
        let mut worklist: VecDeque<(u32, Side)> = VecDeque::new();
        worklist.push_back((start, Side::A));
        labels[start as usize] = CellLabel::Provisional {
            side: Side::A,
            zone,
        };

        while let Some((seed, side)) = worklist.pop_front() {
            if let CellLabel::Settled { side: s, zone: z } = labels[seed as usize] {
                if z == zone && s != side {
                    return Err(CrackError::inconsistency(format!(
                        "flood seed {seed} already settled on the opposite side of zone {zone}"
                    )));
                }
                continue;
            }
            floods += 1;
            if floods > flood_cap {
                return Err(CrackError::inconsistency(
                    "side flood did not converge within the iteration cap",
                ));
            }

            for cell in adjacency.spread_from_seed(seed) {
                if let CellLabel::Settled { side: s, zone: z } = labels[cell as usize] {
                    if z == zone && s != side {
                        return Err(CrackError::inconsistency(format!(
                            "flood reached cell {cell} settled on the opposite side of zone {zone}"
                        )));
                    }
                }
                labels[cell as usize] = CellLabel::Settled { side, zone };

                let Some(&partner) = partner_of.get(&cell) else {
                    continue;
                };
                match labels[partner as usize] {
                    CellLabel::Unlabeled => {
                        labels[partner as usize] = CellLabel::Provisional {
                            side: side.opposite(),
                            zone,
                        };
                        worklist.push_back((partner, side.opposite()));
                    }
                    CellLabel::Provisional { side: s, zone: z } => {
                        if z == zone && s == side {
                            return Err(CrackError::inconsistency(format!(
                                "cell {cell} and its partner {partner} queued on one side of zone {zone}"
                            )));
                        }
                    }
                    CellLabel::Settled { side: s, zone: z } => {
                        if z == zone && s == side {
                            return Err(CrackError::inconsistency(format!(
                                "cell {cell} and its partner {partner} settled on one side of zone {zone}"
                            )));
                        }
                    }
                    CellLabel::Inherited { .. } => {}
                }
            }
        }
    }
    debug!(
        target: "mesh_crack::classify",
        zones = zone_count,
        cells = n,
        "Side flood complete"
    );
    Ok((labels, zone_count))
}

/// Assign a side to the cells touching the crack only through nodes, by
/// copying the label of a settled face neighbour.
///
/// Only `Settled` neighbours count as sources: an inherited label must
/// trace back to a cell with a face on the crack. When a cell already
/// inherited one side and a later neighbour is settled on the other, the
/// two spread zones collided with opposite orientations and the
/// neighbour's whole zone is flipped.
fn inherit_from_neighbors(labels: &mut [CellLabel], adjacency: &CellAdjacency) {
    for cell in 0..labels.len() {
        if labels[cell] != CellLabel::Unlabeled {
            continue;
        }
        for &neighbor in adjacency.neighbors_of(cell as u32) {
            let CellLabel::Settled { side, zone } = labels[neighbor as usize] else {
                continue;
            };
            match labels[cell] {
                CellLabel::Unlabeled => {
                    labels[cell] = CellLabel::Inherited { side, zone };
                }
                CellLabel::Inherited { side: current, .. } if current != side => {
                    warn!(
                        target: "mesh_crack::classify",
                        cell,
                        zone,
                        "Conflicting spread zones around corner-contact cell, flipping zone"
                    );
                    flip_zone(labels, zone);
                }
                _ => {}
            }
        }
    }
}

/// Flip the side of every cell of one zone, settled and inherited alike.
fn flip_zone(labels: &mut [CellLabel], zone: u32) {
    for label in labels.iter_mut() {
        *label = match *label {
            CellLabel::Settled { side, zone: z } if z == zone => CellLabel::Settled {
                side: side.opposite(),
                zone: z,
            },
            CellLabel::Inherited { side, zone: z } if z == zone => CellLabel::Inherited {
                side: side.opposite(),
                zone: z,
            },
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::find_nodes_to_duplicate;
    use crate::types::CellType;

    /// Row of `n` quads sharing vertical edges.
    fn quad_row(n: u32) -> Mesh {
        let mut coords = Vec::new();
        for x in 0..=n {
            coords.push([x as f64, 0.0, 0.0]);
            coords.push([x as f64, 1.0, 0.0]);
        }
        let mut mesh = Mesh::from_coords(coords);
        for i in 0..n {
            let n0 = 2 * i;
            mesh.add_cell(CellType::Quad4, &[n0, n0 + 2, n0 + 3, n0 + 1]);
        }
        mesh
    }

    #[test]
    fn two_quads_split_across_shared_edge() {
        let m0 = quad_row(2);
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Seg2, &[2, 3]);
        let dupl = find_nodes_to_duplicate(&m0, &group).unwrap();
        assert_eq!(dupl, vec![2, 3]);
        let partition = find_cells_to_renumber(&m0, &group, &dupl).unwrap();
        assert_eq!(partition.zone_count, 1);
        let mut sides = vec![
            partition.cells_to_renumber.clone(),
            partition.cells_untouched.clone(),
        ];
        sides.sort();
        assert_eq!(sides, vec![vec![0], vec![1]]);
    }

    #[test]
    fn empty_duplication_yields_empty_partition() {
        let m0 = quad_row(2);
        let mut group = Mesh::new(m0.coords().clone());
        group.add_cell(CellType::Seg2, &[2, 3]);
        let partition = find_cells_to_renumber(&m0, &group, &[]).unwrap();
        assert!(partition.cells_to_renumber.is_empty());
        assert!(partition.cells_untouched.is_empty());
        assert_eq!(partition.zone_count, 0);
    }

    #[test]
    fn inheritance_copies_settled_neighbors() {
        let mesh = quad_row(4);
        let desc = DescendingConnectivity::build(&mesh);
        let adjacency = CellAdjacency::build(&desc);
        let mut labels = vec![CellLabel::Unlabeled; 4];
        labels[0] = CellLabel::Settled {
            side: Side::A,
            zone: 0,
        };
        labels[3] = CellLabel::Settled {
            side: Side::B,
            zone: 1,
        };
        inherit_from_neighbors(&mut labels, &adjacency);
        assert_eq!(
            labels[1],
            CellLabel::Inherited {
                side: Side::A,
                zone: 0
            }
        );
        assert_eq!(
            labels[2],
            CellLabel::Inherited {
                side: Side::B,
                zone: 1
            }
        );
    }

    #[test]
    fn conflicting_zones_are_flipped() {
        // Chain 0-1-2 where the two ends were settled by independent
        // zones with incompatible orientations.
        let mesh = quad_row(3);
        let desc = DescendingConnectivity::build(&mesh);
        let adjacency = CellAdjacency::build(&desc);
        let mut labels = vec![CellLabel::Unlabeled; 3];
        labels[0] = CellLabel::Settled {
            side: Side::A,
            zone: 0,
        };
        labels[2] = CellLabel::Settled {
            side: Side::B,
            zone: 1,
        };
        inherit_from_neighbors(&mut labels, &adjacency);
        // Cell 1 inherits A from zone 0 first, then meets zone 1 settled
        // on B: zone 1 flips entirely.
        assert_eq!(
            labels[1],
            CellLabel::Inherited {
                side: Side::A,
                zone: 0
            }
        );
        assert_eq!(
            labels[2],
            CellLabel::Settled {
                side: Side::A,
                zone: 1
            }
        );
    }

    #[test]
    fn partition_display_reports_counts() {
        let partition = CellPartition {
            cells_to_renumber: vec![0, 2],
            cells_untouched: vec![1, 3],
            zone_count: 1,
        };
        let report = partition.to_string();
        assert!(report.contains("Cells to renumber: 2"));
        assert!(report.contains("Independent zones: 1"));
    }
}
