//! Transitive-closure cluster resolution

use crate::cluster::{Cluster, Partition};
use crate::error::{AmalgamateError, Result};
use crate::graph::ThresholdGraph;

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of group i)
    parent: Vec<u32>,

    /// Size of each set, valid at roots (for union by size)
    size: Vec<u32>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        // Initialize each group as its own set
        let parent = (0..size as u32).collect();
        let size = vec![1; size];

        Self { parent, size }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let px = self.parent[x as usize];
        if px != x {
            // Path compression: set parent to root
            self.parent[x as usize] = self.find(px);
        }
        self.parent[x as usize]
    }

    /// Union the sets containing x and y; returns false if already joined
    pub fn union(&mut self, x: u32, y: u32) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return false;
        }

        // Attach smaller tree under root of larger tree
        let (big, small) = if self.size[root_x as usize] >= self.size[root_y as usize] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };

        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
        true
    }
}

/// Partition the groups of `graph` into connected components
///
/// Unions are applied in passes over every neighborhood until a pass merges
/// nothing. Each productive pass removes at least one set, so more passes
/// than groups means the union-find itself is broken.
pub fn resolve_clusters(graph: &ThresholdGraph) -> Result<Partition> {
    let node_count = graph.node_count;
    log::info!("Resolving clusters among {} groups", node_count);

    let mut sets = DisjointSets::new(node_count);
    let max_passes = node_count.max(1);
    let mut converged = false;

    for pass in 1..=max_passes {
        let mut merges = 0usize;

        for node in 0..node_count {
            for &neighbor in graph.neighbors(node) {
                if sets.union(node as u32, neighbor) {
                    merges += 1;
                }
            }
        }

        log::debug!("Resolution pass {}: {} merges", pass, merges);

        if merges == 0 {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(AmalgamateError::InternalInvariantViolation(format!(
            "cluster resolution still merging after {max_passes} passes"
        )));
    }

    // Number clusters by first member so the output is independent of root choice
    let mut cluster_of_root: Vec<Option<usize>> = vec![None; node_count];
    let mut clusters: Vec<Cluster> = Vec::new();

    for node in 0..node_count {
        let root = sets.find(node as u32) as usize;
        let idx = *cluster_of_root[root].get_or_insert_with(|| {
            clusters.push(Cluster {
                members: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].members.push(node);
    }

    verify_partition(&clusters, node_count)?;

    log::info!(
        "Found {} clusters, {} with more than one group",
        clusters.len(),
        clusters.iter().filter(|c| !c.is_singleton()).count()
    );

    Ok(Partition {
        clusters,
        group_names: graph.group_names.clone(),
    })
}

/// Check that every group sits in exactly one cluster
fn verify_partition(clusters: &[Cluster], node_count: usize) -> Result<()> {
    let mut seen = vec![0u32; node_count];

    for member in clusters.iter().flat_map(|c| c.members.iter()) {
        match seen.get_mut(*member) {
            Some(count) => *count += 1,
            None => {
                return Err(AmalgamateError::InternalInvariantViolation(format!(
                    "cluster member {member} out of range for {node_count} groups"
                )))
            }
        }
    }

    if let Some(group) = seen.iter().position(|&count| count != 1) {
        return Err(AmalgamateError::InternalInvariantViolation(format!(
            "group {group} appears in {} clusters",
            seen[group]
        )));
    }

    Ok(())
}
