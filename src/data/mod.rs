//! Input data: distance matrices and the datasets they describe

pub mod dataset;
pub mod matrix;
pub mod recode;

pub use dataset::{FrameDataset, GroupedDataset, LabeledDataset};
pub use matrix::DistanceMatrix;
pub use recode::{recode, recode_from_path};
