//! Amalgamation pipeline: matrix -> graph -> clusters -> table -> recoded dataset

use std::path::PathBuf;

use serde::Serialize;

use crate::cluster::detection::resolve_clusters;
use crate::cluster::naming::{build_table, describe, name_clusters};
use crate::cluster::{AmalgamationOutcome, Partition, ReassignmentTable};
use crate::config::Config;
use crate::data::{recode, DistanceMatrix, GroupedDataset};
use crate::error::{AmalgamateError, Result};
use crate::graph::GraphBuilder;
use crate::storage;

/// Result of clustering one distance matrix, before anything is persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amalgamation {
    /// Threshold requested by the caller
    pub threshold: f64,

    /// Threshold used for comparisons after tolerance substitution
    pub effective_threshold: f64,

    pub iteration: String,

    #[serde(skip)]
    pub partition: Partition,

    pub table: ReassignmentTable,

    pub outcome: AmalgamationOutcome,
}

impl Amalgamation {
    pub fn amalgamated(&self) -> bool {
        self.outcome.amalgamated()
    }
}

/// Cluster a matrix and name the clusters
///
/// Pure: same matrix and config, same result. Nothing is written.
pub fn plan(matrix: &DistanceMatrix, config: &Config) -> Result<Amalgamation> {
    let effective_threshold = config.effective_threshold()?;
    if effective_threshold != config.threshold {
        log::info!(
            "Threshold {} widened to {} to absorb floating-point error",
            config.threshold,
            effective_threshold
        );
    }

    let graph = GraphBuilder::from_matrix(matrix, effective_threshold);
    let partition = resolve_clusters(&graph)?;
    let names = name_clusters(&partition, &config.name_prefix, &config.iteration)?;
    let table = build_table(&partition, &names);
    let outcome = describe(&partition, &names);

    Ok(Amalgamation {
        threshold: config.threshold,
        effective_threshold,
        iteration: config.iteration.clone(),
        partition,
        table,
        outcome,
    })
}

/// Outcome of one amalgamation applied to a dataset
#[derive(Debug, Clone)]
pub struct AmalgamationReport<D> {
    /// Recoded copy of the input dataset (unchanged if nothing merged)
    pub dataset: D,

    pub amalgamation: Amalgamation,

    /// Where the table was written; `None` when nothing merged
    pub table_path: Option<PathBuf>,
}

impl<D> AmalgamationReport<D> {
    pub fn amalgamated(&self) -> bool {
        self.amalgamation.amalgamated()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::new(&self.amalgamation, self.table_path.as_ref())
    }
}

/// Serializable digest of one round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub iteration: String,
    pub threshold: f64,
    pub effective_threshold: f64,
    pub group_count: usize,
    pub cluster_count: usize,
    pub table_path: Option<String>,
    pub outcome: AmalgamationOutcome,
}

impl RunSummary {
    fn new(amalgamation: &Amalgamation, table_path: Option<&PathBuf>) -> Self {
        Self {
            iteration: amalgamation.iteration.clone(),
            threshold: amalgamation.threshold,
            effective_threshold: amalgamation.effective_threshold,
            group_count: amalgamation.partition.group_names.len(),
            cluster_count: amalgamation.partition.clusters.len(),
            table_path: table_path.map(|p| p.display().to_string()),
            outcome: amalgamation.outcome.clone(),
        }
    }
}

/// Amalgamate the groups of `dataset` using `matrix`
///
/// The matrix must cover exactly the dataset's groups. When something
/// merged, the table is written to the configured sink and the dataset copy
/// is recoded; otherwise no file is written and the copy is unchanged.
pub fn amalgamate<D: GroupedDataset>(
    dataset: &D,
    matrix: &DistanceMatrix,
    config: &Config,
) -> Result<AmalgamationReport<D>> {
    let groups = dataset.groups()?;
    log::info!(
        "Amalgamating {} groups across {} entities (iteration {})",
        groups.len(),
        dataset.entity_count(),
        config.iteration
    );

    let matrix = matrix.aligned_to(&groups)?;
    let amalgamation = plan(&matrix, config)?;

    if !amalgamation.amalgamated() {
        log::info!("{}", amalgamation.outcome);
        return Ok(AmalgamationReport {
            dataset: dataset.clone(),
            amalgamation,
            table_path: None,
        });
    }

    log::info!("{}", amalgamation.outcome);

    let path = config.table_path();
    if let Err(source) = storage::write_table(&amalgamation.table, &path) {
        log::error!("{}", source);
        return Err(AmalgamateError::TablePersist {
            source: Box::new(source),
            amalgamation: Box::new(amalgamation),
        });
    }

    let recoded = recode(dataset, &amalgamation.table)?;

    Ok(AmalgamationReport {
        dataset: recoded,
        amalgamation,
        table_path: Some(path),
    })
}

/// Supplies a distance matrix for the current state of a dataset
///
/// Used between rounds, after groups have been merged.
pub trait DistanceProvider<D> {
    fn distances(&mut self, dataset: &D) -> Result<DistanceMatrix>;
}

impl<D, F> DistanceProvider<D> for F
where
    F: FnMut(&D) -> Result<DistanceMatrix>,
{
    fn distances(&mut self, dataset: &D) -> Result<DistanceMatrix> {
        self(dataset)
    }
}

/// Final dataset and the per-round history of a multi-round run
#[derive(Debug, Clone)]
pub struct StableAmalgamation<D> {
    pub dataset: D,

    /// Every round, the last one being the round that merged nothing
    pub rounds: Vec<AmalgamationReport<()>>,
}

impl<D> StableAmalgamation<D> {
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.rounds.iter().map(|round| round.summary()).collect()
    }
}

/// Repeat amalgamation until a round merges nothing
///
/// Round `k` is tagged `k` and writes its table next to the configured sink
/// as `<stem>_<k>.<ext>`. Every productive round removes at least one group,
/// so the round count is bounded by the initial group count.
pub fn amalgamate_until_stable<D, P>(
    dataset: &D,
    provider: &mut P,
    config: &Config,
) -> Result<StableAmalgamation<D>>
where
    D: GroupedDataset,
    P: DistanceProvider<D>,
{
    let base = config.table_path();
    let max_rounds = dataset.groups()?.len().max(1);

    let mut current = dataset.clone();
    let mut rounds = Vec::new();

    for round in 1..=max_rounds {
        let matrix = provider.distances(&current)?;
        let round_config = Config {
            iteration: round.to_string(),
            table_path: Some(storage::round_table_path(&base, round)),
            ..config.clone()
        };

        let report = amalgamate(&current, &matrix, &round_config)?;
        let stable = !report.amalgamated();

        current = report.dataset;
        rounds.push(AmalgamationReport {
            dataset: (),
            amalgamation: report.amalgamation,
            table_path: report.table_path,
        });

        if stable {
            log::info!("Groups stable after {} rounds", round);
            return Ok(StableAmalgamation {
                dataset: current,
                rounds,
            });
        }
    }

    Err(AmalgamateError::InternalInvariantViolation(format!(
        "amalgamation still merging after {max_rounds} rounds"
    )))
}
