//! Threshold-based amalgamation of groups in a labeled dataset

pub mod amalgamate;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;

pub use amalgamate::{
    amalgamate, amalgamate_until_stable, plan, Amalgamation, AmalgamationReport,
    DistanceProvider, RunSummary, StableAmalgamation,
};
pub use cluster::{AmalgamationOutcome, Grouping, ReassignmentTable};
pub use config::{Config, ToleranceMode};
pub use data::{DistanceMatrix, FrameDataset, GroupedDataset, LabeledDataset};
pub use error::{AmalgamateError, Result};
