//! Property checks for cluster resolution: partition, monotonicity,
//! determinism, symmetry independence and fixed-point idempotence.

use population_amalgamator::{plan, Config, DistanceMatrix, LabeledDataset, ToleranceMode};
use population_amalgamator::data::recode;
use population_amalgamator::GroupedDataset;
use proptest::prelude::*;

/// Index into a condensed lower triangle, `i > j`
fn condensed(i: usize, j: usize) -> usize {
    i * (i - 1) / 2 + j
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("pop{i}")).collect()
}

/// Build rows with the given triangle populated and the other left missing
fn rows(n: usize, distances: &[f64], lower: bool, upper: bool) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| match i.cmp(&j) {
                    std::cmp::Ordering::Equal => f64::NAN,
                    std::cmp::Ordering::Greater if lower => distances[condensed(i, j)],
                    std::cmp::Ordering::Less if upper => distances[condensed(j, i)],
                    _ => f64::NAN,
                })
                .collect()
        })
        .collect()
}

fn full_matrix(n: usize, distances: &[f64]) -> DistanceMatrix {
    DistanceMatrix::from_rows(names(n), rows(n, distances, true, true)).unwrap()
}

fn config(threshold: f64) -> Config {
    Config::new(threshold, "1", None)
}

fn sorted_sets(mut sets: Vec<Vec<String>>) -> Vec<Vec<String>> {
    for set in &mut sets {
        set.sort();
    }
    sets.sort();
    sets
}

fn instance() -> impl Strategy<Value = (usize, Vec<f64>)> {
    (1usize..9).prop_flat_map(|n| {
        let pairs = n * (n - 1) / 2;
        (Just(n), prop::collection::vec(0.0f64..1.0, pairs))
    })
}

proptest! {
    #[test]
    fn clusters_partition_the_groups((n, d) in instance(), t in 0.001f64..1.0) {
        let amalgamation = plan(&full_matrix(n, &d), &config(t)).unwrap();
        let mut seen = vec![0; n];
        for cluster in &amalgamation.partition.clusters {
            prop_assert!(!cluster.members.is_empty());
            for &member in &cluster.members {
                seen[member] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
        prop_assert_eq!(amalgamation.table.len(), n);
    }

    #[test]
    fn same_cluster_iff_threshold_path((n, d) in instance(), t in 0.001f64..1.0) {
        let amalgamation = plan(&full_matrix(n, &d), &config(t)).unwrap();
        let assignment = amalgamation.partition.assignments();

        // Reachability by repeated relaxation over direct links
        let mut reach: Vec<Vec<bool>> = (0..n)
            .map(|i| (0..n).map(|j| i == j || d[condensed(i.max(j), i.min(j))] <= t).collect())
            .collect();
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if reach[i][k] && reach[k][j] {
                        reach[i][j] = true;
                    }
                }
            }
        }

        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(reach[i][j], assignment[i] == assignment[j]);
            }
        }
    }

    #[test]
    fn raising_the_threshold_never_splits((n, d) in instance(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let matrix = full_matrix(n, &d);
        let floor = |t| Config { tolerance_mode: ToleranceMode::Floor, ..config(t) };
        let strict = plan(&matrix, &floor(low)).unwrap().partition.assignments();
        let loose = plan(&matrix, &floor(high)).unwrap().partition.assignments();

        for i in 0..n {
            for j in 0..n {
                if strict[i] == strict[j] {
                    prop_assert_eq!(loose[i], loose[j]);
                }
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_results((n, d) in instance(), t in 0.0f64..1.0) {
        let matrix = full_matrix(n, &d);
        let first = plan(&matrix, &config(t)).unwrap();
        let second = plan(&matrix.clone(), &config(t)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn group_order_does_not_change_membership((n, d) in instance(), t in 0.001f64..1.0) {
        let matrix = full_matrix(n, &d);
        let mut reversed = names(n);
        reversed.reverse();

        let forward = plan(&matrix, &config(t)).unwrap();
        let backward = plan(&matrix.aligned_to(&reversed).unwrap(), &config(t)).unwrap();

        prop_assert_eq!(
            sorted_sets(forward.partition.as_name_sets()),
            sorted_sets(backward.partition.as_name_sets())
        );
    }

    #[test]
    fn upper_and_lower_triangles_agree((n, d) in instance(), t in 0.0f64..1.0) {
        let lower = DistanceMatrix::from_rows(names(n), rows(n, &d, true, false)).unwrap();
        let upper = DistanceMatrix::from_rows(names(n), rows(n, &d, false, true)).unwrap();
        prop_assert_eq!(
            plan(&lower, &config(t)).unwrap(),
            plan(&upper, &config(t)).unwrap()
        );
    }

    #[test]
    fn recoded_groups_do_not_merge_again((n, d) in instance(), t in 0.001f64..1.0) {
        let matrix = full_matrix(n, &d);
        let amalgamation = plan(&matrix, &config(t)).unwrap();

        let dataset = LabeledDataset::from_labels(names(n));
        let recoded = recode(&dataset, &amalgamation.table).unwrap();
        let groups = recoded.groups().unwrap();

        // Single-linkage distance between the recoded groups
        let labels = &recoded.labels;
        let merged_rows: Vec<Vec<f64>> = groups
            .iter()
            .map(|a| {
                groups
                    .iter()
                    .map(|b| {
                        let mut best = f64::INFINITY;
                        for i in 0..n {
                            for j in 0..n {
                                if i != j && &labels[i] == a && &labels[j] == b {
                                    best = best.min(matrix.distance(i, j));
                                }
                            }
                        }
                        best
                    })
                    .collect()
            })
            .collect();

        let next = DistanceMatrix::from_rows(groups, merged_rows).unwrap();
        let again = plan(&next, &Config::new(t, "2", None)).unwrap();
        prop_assert!(!again.amalgamated());
    }
}
