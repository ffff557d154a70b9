//! Cluster resolution and naming

pub mod detection;
pub mod naming;

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A connected component of the threshold graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member group indices, ascending
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Disjoint clusters covering every group exactly once
///
/// Clusters are ordered by their first member, members by group index, so
/// the same input always yields the same partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub clusters: Vec<Cluster>,

    /// Group names, indexed like the cluster members
    pub group_names: Vec<String>,
}

impl Partition {
    /// Names of a cluster's members in group order
    pub fn member_names(&self, cluster: &Cluster) -> Vec<String> {
        cluster
            .members
            .iter()
            .map(|&idx| self.group_names[idx].clone())
            .collect()
    }

    /// Cluster index of every group
    pub fn assignments(&self) -> Vec<usize> {
        let mut assignment = vec![0; self.group_names.len()];
        for (cluster_idx, cluster) in self.clusters.iter().enumerate() {
            for &member in &cluster.members {
                assignment[member] = cluster_idx;
            }
        }
        assignment
    }

    /// Number of clusters with more than one member
    pub fn merged_count(&self) -> usize {
        self.clusters.iter().filter(|c| !c.is_singleton()).count()
    }

    /// Member name lists, handy for comparing partitions
    pub fn as_name_sets(&self) -> Vec<Vec<String>> {
        self.clusters.iter().map(|c| self.member_names(c)).collect()
    }
}

/// One row of the reassignment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassignment {
    pub original: String,
    pub new: String,
}

/// Mapping from original group name to amalgamated group name
///
/// Holds one entry per original group, in the input group order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReassignmentTable {
    entries: Vec<Reassignment>,
}

impl ReassignmentTable {
    pub fn new(entries: Vec<Reassignment>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Reassignment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New name for `original`, if the table has an entry for it
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.original == original)
            .map(|entry| entry.new.as_str())
    }

    /// Lookup map from original to new name; the first entry wins on duplicates
    pub fn lookup(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            map.entry(entry.original.as_str())
                .or_insert(entry.new.as_str());
        }
        map
    }

    /// True when no entry renames its group
    pub fn is_identity(&self) -> bool {
        self.entries.iter().all(|entry| entry.original == entry.new)
    }
}

/// A multi-member cluster and the name it was given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub name: String,

    /// Original groups subsumed, in group order
    pub members: Vec<String>,
}

/// Whether an invocation merged anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmalgamationOutcome {
    NoAmalgamation,
    Amalgamated { groupings: Vec<Grouping> },
}

impl AmalgamationOutcome {
    pub fn amalgamated(&self) -> bool {
        matches!(self, Self::Amalgamated { .. })
    }

    pub fn groupings(&self) -> &[Grouping] {
        match self {
            Self::NoAmalgamation => &[],
            Self::Amalgamated { groupings } => groupings,
        }
    }
}

impl fmt::Display for AmalgamationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAmalgamation => write!(f, "no amalgamation occurred at this threshold"),
            Self::Amalgamated { groupings } => {
                write!(f, "amalgamated {} groups", groupings.len())?;
                for grouping in groupings {
                    write!(
                        f,
                        "\n  {} <- {}",
                        grouping.name,
                        grouping.members.iter().join(", ")
                    )?;
                }
                Ok(())
            }
        }
    }
}
