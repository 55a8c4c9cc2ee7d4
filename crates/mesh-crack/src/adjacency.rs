//! Cell adjacency graphs and breadth-first spreading.

use std::collections::VecDeque;

use hashbrown::HashSet;
use tracing::debug;

use crate::connectivity::DescendingConnectivity;

/// Face-neighbour adjacency between the cells of a mesh.
///
/// Two cells are adjacent when they share a (D-1)-dimensional sub-element.
/// The graph can be built with a set of sub-elements removed, which is how
/// a crack surface is made impassable before flooding each side.
#[derive(Debug)]
pub struct CellAdjacency {
    neighbors: Vec<Vec<u32>>,
}

impl CellAdjacency {
    /// Build the full adjacency graph from a descending connectivity.
    pub fn build(desc: &DescendingConnectivity) -> Self {
        Self::build_without(desc, &HashSet::new())
    }

    /// Build the adjacency graph ignoring the given sub-elements: no edge
    /// crosses a sub-element in `excluded`.
    pub fn build_without(desc: &DescendingConnectivity, excluded: &HashSet<u32>) -> Self {
        let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); desc.cell_to_subs.len()];
        for (sub_id, cells) in desc.sub_to_cells.iter().enumerate() {
            if excluded.contains(&(sub_id as u32)) {
                continue;
            }
            if let [a, b] = cells[..] {
                neighbors[a as usize].push(b);
                neighbors[b as usize].push(a);
            }
        }
        debug!(
            target: "mesh_crack::adjacency",
            cells = neighbors.len(),
            excluded = excluded.len(),
            "Built cell adjacency"
        );
        Self { neighbors }
    }

    /// Number of cells in the graph.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.neighbors.len()
    }

    /// The face neighbours of a cell.
    #[inline]
    pub fn neighbors_of(&self, cell: u32) -> &[u32] {
        &self.neighbors[cell as usize]
    }

    /// All cells reachable from `seed` by walking the graph, `seed`
    /// included. The result is sorted.
    pub fn spread_from_seed(&self, seed: u32) -> Vec<u32> {
        let mut visited: HashSet<u32> = HashSet::new();
        let mut queue: VecDeque<u32> = VecDeque::new();
        visited.insert(seed);
        queue.push_back(seed);
        while let Some(cell) = queue.pop_front() {
            for &next in self.neighbors_of(cell) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        let mut cells: Vec<u32> = visited.into_iter().collect();
        cells.sort_unstable();
        cells
    }
}
