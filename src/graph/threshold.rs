//! Compact threshold-neighborhood graph

/// Compressed sparse representation of the threshold graph
///
/// Row `i` lists every group within threshold distance of group `i`,
/// including `i` itself, sorted by group index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdGraph {
    /// Number of groups in the graph
    pub node_count: usize,

    /// Offset array: index where each group's neighbors begin
    /// offsets[i] to offsets[i+1] defines the neighbor range for group i
    pub offsets: Vec<u32>,

    /// Neighbor array: concatenated neighborhoods
    pub neighbors: Vec<u32>,

    /// Group names, indexed like the rows
    pub group_names: Vec<String>,
}

impl ThresholdGraph {
    /// Create a new graph with pre-allocated capacity
    pub fn with_capacity(node_count: usize, neighbor_count: usize) -> Self {
        Self {
            node_count,
            offsets: Vec::with_capacity(node_count + 1),
            neighbors: Vec::with_capacity(neighbor_count),
            group_names: Vec::with_capacity(node_count),
        }
    }

    /// Threshold neighborhood of a group (self included)
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.neighbors[start..end]
    }

    /// Check whether `dst` is within threshold of `src`
    pub fn is_linked(&self, src: usize, dst: u32) -> bool {
        self.neighbors(src).binary_search(&dst).is_ok()
    }

    /// Size of a group's neighborhood, self included
    pub fn degree(&self, node: usize) -> usize {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        end - start
    }

    /// Number of undirected links between distinct groups
    pub fn edge_count(&self) -> usize {
        (0..self.node_count)
            .map(|node| {
                self.neighbors(node)
                    .iter()
                    .filter(|&&other| other as usize > node)
                    .count()
            })
            .sum()
    }
}
