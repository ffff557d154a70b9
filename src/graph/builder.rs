//! Threshold graph construction

use crate::data::DistanceMatrix;
use crate::graph::ThresholdGraph;

/// Builds a [`ThresholdGraph`] one neighborhood at a time
pub struct GraphBuilder {
    /// Group names in index order
    group_names: Vec<String>,

    /// Neighborhood of each group
    adjacency_lists: Vec<Vec<u32>>,
}

impl GraphBuilder {
    /// Create a builder with one empty neighborhood per group
    pub fn new(group_names: Vec<String>) -> Self {
        let adjacency_lists = vec![Vec::new(); group_names.len()];
        Self {
            group_names,
            adjacency_lists,
        }
    }

    /// Derive every group's threshold neighborhood from a distance matrix
    ///
    /// Each group is always its own neighbor, even when the stored diagonal
    /// is missing. Pairs with no distance are never linked.
    pub fn from_matrix(matrix: &DistanceMatrix, threshold: f64) -> ThresholdGraph {
        log::info!(
            "Building threshold graph for {} groups at threshold {}",
            matrix.len(),
            threshold
        );

        let mut builder = Self::new(matrix.labels().to_vec());
        let n = matrix.len();

        for i in 0..n {
            builder.add_neighbor(i as u32, i as u32);
            for j in 0..i {
                // NaN compares false and so never links
                if matrix.distance(i, j) <= threshold {
                    builder.add_link(i as u32, j as u32);
                }
            }
        }

        let graph = builder.build();
        log::info!("Threshold graph has {} links", graph.edge_count());
        graph
    }

    /// Add `dst` to the neighborhood of `src` only
    pub fn add_neighbor(&mut self, src: u32, dst: u32) {
        self.adjacency_lists[src as usize].push(dst);
    }

    /// Add an undirected link between two groups
    pub fn add_link(&mut self, a: u32, b: u32) {
        self.add_neighbor(a, b);
        self.add_neighbor(b, a);
    }

    /// Build the compressed graph
    pub fn build(mut self) -> ThresholdGraph {
        let neighbor_count: usize = self.adjacency_lists.iter().map(|list| list.len()).sum();
        let node_count = self.group_names.len();

        let mut graph = ThresholdGraph::with_capacity(node_count, neighbor_count);
        graph.offsets.push(0);

        let mut offset = 0;
        for list in &mut self.adjacency_lists {
            // Sorted for binary search, deduplicated for set semantics
            list.sort_unstable();
            list.dedup();
            offset += list.len() as u32;
            graph.offsets.push(offset);
            graph.neighbors.extend_from_slice(list);
        }

        graph.group_names = self.group_names;
        graph
    }
}
