//! Deterministic cluster naming and reassignment tables

use std::cmp::Ordering;
use std::collections::HashSet;

use itertools::Itertools;

use crate::cluster::{AmalgamationOutcome, Grouping, Partition, Reassignment, ReassignmentTable};
use crate::error::{AmalgamateError, Result};

/// Separator used when measuring a cluster's combined name
const NAME_JOINER: &str = "-";

/// Names chosen for every cluster of a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNames {
    /// Name per cluster, indexed like `Partition::clusters`
    pub names: Vec<String>,

    /// Multi-member cluster indices in rank order (rank 1 first)
    pub ranked: Vec<usize>,
}

/// Sort key for multi-member clusters
struct RankKey {
    cluster: usize,
    combined_len: usize,
    members: Vec<String>,
}

fn compare_rank(a: &RankKey, b: &RankKey) -> Ordering {
    // Longest combined name first, then alphabetical by first member
    b.combined_len
        .cmp(&a.combined_len)
        .then_with(|| a.members[0].cmp(&b.members[0]))
        .then_with(|| a.members.cmp(&b.members))
        .then_with(|| a.cluster.cmp(&b.cluster))
}

/// Name every cluster
///
/// Singletons keep their group name. Multi-member clusters are ranked and
/// named `<prefix>_<iteration>.<rank>`.
pub fn name_clusters(partition: &Partition, prefix: &str, iteration: &str) -> Result<ClusterNames> {
    let mut keys: Vec<RankKey> = partition
        .clusters
        .iter()
        .enumerate()
        .filter(|(_, cluster)| !cluster.is_singleton())
        .map(|(cluster, members)| {
            let members = partition.member_names(members);
            RankKey {
                cluster,
                combined_len: members.iter().join(NAME_JOINER).len(),
                members,
            }
        })
        .collect();

    keys.sort_by(compare_rank);

    let mut names: Vec<String> = partition
        .clusters
        .iter()
        .map(|cluster| match cluster.members.as_slice() {
            [only] => partition.group_names[*only].clone(),
            _ => String::new(),
        })
        .collect();

    let all_groups: HashSet<&str> = partition.group_names.iter().map(String::as_str).collect();

    for (rank, key) in keys.iter().enumerate() {
        let name = format!("{}_{}.{}", prefix, iteration, rank + 1);

        // Reusing a foreign group's name would silently merge it on recode
        if all_groups.contains(name.as_str()) && !key.members.contains(&name) {
            return Err(AmalgamateError::NameCollision { name });
        }

        log::debug!("{} <- {}", name, key.members.iter().join(", "));
        names[key.cluster] = name;
    }

    Ok(ClusterNames {
        names,
        ranked: keys.iter().map(|key| key.cluster).collect(),
    })
}

/// One (original, new) entry per group, in group order
pub fn build_table(partition: &Partition, names: &ClusterNames) -> ReassignmentTable {
    let entries = partition
        .assignments()
        .into_iter()
        .zip(&partition.group_names)
        .map(|(cluster, original)| Reassignment {
            original: original.clone(),
            new: names.names[cluster].clone(),
        })
        .collect();

    ReassignmentTable::new(entries)
}

/// Summarize which groups were merged under which name
pub fn describe(partition: &Partition, names: &ClusterNames) -> AmalgamationOutcome {
    if names.ranked.is_empty() {
        return AmalgamationOutcome::NoAmalgamation;
    }

    let groupings = names
        .ranked
        .iter()
        .map(|&cluster| Grouping {
            name: names.names[cluster].clone(),
            members: partition.member_names(&partition.clusters[cluster]),
        })
        .collect();

    AmalgamationOutcome::Amalgamated { groupings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;

    fn partition(names: &[&str], clusters: &[&[usize]]) -> Partition {
        Partition {
            clusters: clusters
                .iter()
                .map(|members| Cluster {
                    members: members.to_vec(),
                })
                .collect(),
            group_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn singletons_keep_their_names() {
        let p = partition(&["A", "B"], &[&[0], &[1]]);
        let names = name_clusters(&p, "Group", "1").unwrap();
        assert_eq!(names.names, vec!["A", "B"]);
        assert!(names.ranked.is_empty());
        assert_eq!(describe(&p, &names), AmalgamationOutcome::NoAmalgamation);
        assert!(build_table(&p, &names).is_identity());
    }

    #[test]
    fn longer_combined_names_rank_first() {
        // "C-D-E" (5 chars) outranks "A-B" (3 chars)
        let p = partition(&["A", "B", "C", "D", "E"], &[&[0, 1], &[2, 3, 4]]);
        let names = name_clusters(&p, "Group", "2").unwrap();
        assert_eq!(names.names, vec!["Group_2.2", "Group_2.1"]);
        assert_eq!(names.ranked, vec![1, 0]);
    }

    #[test]
    fn equal_lengths_break_ties_alphabetically() {
        let p = partition(&["Zed", "Yak", "Ant", "Bee"], &[&[0, 1], &[2, 3]]);
        let names = name_clusters(&p, "Group", "1").unwrap();
        assert_eq!(names.names, vec!["Group_1.2", "Group_1.1"]);
    }

    #[test]
    fn table_follows_group_order() {
        let p = partition(&["A", "B", "C", "D"], &[&[0, 2], &[1], &[3]]);
        let names = name_clusters(&p, "Group", "1").unwrap();
        let table = build_table(&p, &names);

        let rows: Vec<(&str, &str)> = table
            .entries()
            .iter()
            .map(|e| (e.original.as_str(), e.new.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![("A", "Group_1.1"), ("B", "B"), ("C", "Group_1.1"), ("D", "D")]
        );

        match describe(&p, &names) {
            AmalgamationOutcome::Amalgamated { groupings } => {
                assert_eq!(groupings.len(), 1);
                assert_eq!(groupings[0].name, "Group_1.1");
                assert_eq!(groupings[0].members, vec!["A", "C"]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn substring_names_are_mapped_exactly() {
        // "pop1" is a substring of "pop10"; only the real members are renamed
        let p = partition(&["pop1", "pop10", "pop2"], &[&[0, 2], &[1]]);
        let names = name_clusters(&p, "Group", "1").unwrap();
        let table = build_table(&p, &names);
        assert_eq!(table.get("pop1"), Some("Group_1.1"));
        assert_eq!(table.get("pop10"), Some("pop10"));
        assert_eq!(table.get("pop2"), Some("Group_1.1"));
    }

    #[test]
    fn colliding_name_is_rejected() {
        let p = partition(&["A", "B", "Group_1.1"], &[&[0, 1], &[2]]);
        assert!(matches!(
            name_clusters(&p, "Group", "1"),
            Err(AmalgamateError::NameCollision { .. })
        ));
    }

    #[test]
    fn member_may_already_carry_the_name() {
        let p = partition(&["Group_1.1", "B"], &[&[0, 1]]);
        let names = name_clusters(&p, "Group", "1").unwrap();
        assert_eq!(names.names, vec!["Group_1.1"]);
    }

    #[test]
    fn custom_prefix_is_used() {
        let p = partition(&["A", "B"], &[&[0, 1]]);
        let names = name_clusters(&p, "pop", "3").unwrap();
        assert_eq!(names.names, vec!["pop_3.1"]);
    }
}
