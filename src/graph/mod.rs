//! Threshold graph representation and construction

pub mod threshold;
pub mod builder;

pub use builder::GraphBuilder;
pub use threshold::ThresholdGraph;
