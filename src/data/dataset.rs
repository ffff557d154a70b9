//! Collaborator datasets whose group labels get amalgamated

use std::fs::File;
use std::path::Path;

use ndarray::Array2;
use polars::prelude::*;

use crate::error::{AmalgamateError, Result};

/// Capability the amalgamator needs from a labeled dataset
///
/// Implementors only expose per-entity group labels; how entities and their
/// attributes are stored is up to them.
pub trait GroupedDataset: Clone {
    /// Number of entities (rows)
    fn entity_count(&self) -> usize;

    /// Current group label of every entity, in entity order
    fn group_labels(&self) -> Result<Vec<String>>;

    /// Replace every entity's group label at once
    fn set_group_labels(&mut self, labels: Vec<String>) -> Result<()>;

    /// Distinct group labels in order of first appearance
    fn groups(&self) -> Result<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        let groups = self
            .group_labels()?
            .into_iter()
            .filter(|label| seen.insert(label.clone()))
            .collect();
        Ok(groups)
    }
}

fn check_label_count(expected: usize, labels: &[String]) -> Result<()> {
    if labels.len() != expected {
        return Err(AmalgamateError::shape(
            format!("{expected} group labels"),
            format!("{} labels", labels.len()),
        ));
    }
    Ok(())
}

/// In-memory entity-by-attribute dataset
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    /// Entity identifiers (e.g. individual names)
    pub entity_ids: Vec<String>,

    /// Group label per entity
    pub labels: Vec<String>,

    /// Attribute values, one row per entity
    pub attributes: Array2<f64>,
}

impl LabeledDataset {
    pub fn new(entity_ids: Vec<String>, labels: Vec<String>, attributes: Array2<f64>) -> Result<Self> {
        check_label_count(entity_ids.len(), &labels)?;

        if attributes.nrows() != entity_ids.len() {
            return Err(AmalgamateError::shape(
                format!("{} attribute rows", entity_ids.len()),
                format!("{} rows", attributes.nrows()),
            ));
        }

        Ok(Self {
            entity_ids,
            labels,
            attributes,
        })
    }

    /// Dataset with labels only and no attribute columns
    pub fn from_labels(labels: Vec<String>) -> Self {
        let entity_ids = (0..labels.len()).map(|i| format!("entity_{i}")).collect();
        let attributes = Array2::zeros((labels.len(), 0));
        Self {
            entity_ids,
            labels,
            attributes,
        }
    }
}

impl GroupedDataset for LabeledDataset {
    fn entity_count(&self) -> usize {
        self.entity_ids.len()
    }

    fn group_labels(&self) -> Result<Vec<String>> {
        Ok(self.labels.clone())
    }

    fn set_group_labels(&mut self, labels: Vec<String>) -> Result<()> {
        check_label_count(self.entity_count(), &labels)?;
        self.labels = labels;
        Ok(())
    }
}

/// Tabular dataset backed by a polars `DataFrame`
#[derive(Debug, Clone)]
pub struct FrameDataset {
    frame: DataFrame,
    group_column: String,
}

impl FrameDataset {
    /// Wrap a frame whose group labels live in `group_column`
    pub fn new(frame: DataFrame, group_column: impl Into<String>) -> Result<Self> {
        let group_column = group_column.into();
        // Fail early on an unknown column
        frame.column(&group_column)?;
        Ok(Self {
            frame,
            group_column,
        })
    }

    /// Load a CSV or Parquet file (chosen by extension)
    pub fn load(path: impl AsRef<Path>, group_column: &str) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading dataset: {}", path.display());

        if !path.exists() {
            return Err(AmalgamateError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )));
        }

        let frame = if is_parquet(path) {
            LazyFrame::scan_parquet(path, Default::default())?.collect()?
        } else {
            CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?
        };

        log::info!("Loaded {} entities with {} columns", frame.height(), frame.width());

        Self::new(frame, group_column)
    }

    /// Fill entities without a group label with `label`
    ///
    /// Establishes the single default group the amalgamator expects when the
    /// source data carries no assignment.
    pub fn with_default_group(mut self, label: &str) -> Result<Self> {
        let current = self.frame.column(&self.group_column)?.cast(&DataType::String)?;
        let missing = current.null_count();
        if missing == 0 {
            return Ok(self);
        }

        log::info!("Assigning {} unlabeled entities to group '{}'", missing, label);

        let labels: Vec<String> = current
            .str()?
            .into_iter()
            .map(|value| value.unwrap_or(label).to_string())
            .collect();
        self.set_group_labels(labels)?;

        Ok(self)
    }

    /// Write the frame back out as CSV or Parquet (chosen by extension)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("Writing dataset: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut frame = self.frame.clone();
        let file = File::create(path)?;

        if is_parquet(path) {
            ParquetWriter::new(file).finish(&mut frame)?;
        } else {
            CsvWriter::new(file).include_header(true).finish(&mut frame)?;
        }

        Ok(())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn group_column(&self) -> &str {
        &self.group_column
    }
}

impl GroupedDataset for FrameDataset {
    fn entity_count(&self) -> usize {
        self.frame.height()
    }

    fn group_labels(&self) -> Result<Vec<String>> {
        let column = self.frame.column(&self.group_column)?.cast(&DataType::String)?;

        column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(entity, value)| {
                value
                    .map(str::to_string)
                    .ok_or(AmalgamateError::MissingGroupLabel { entity })
            })
            .collect()
    }

    fn set_group_labels(&mut self, labels: Vec<String>) -> Result<()> {
        check_label_count(self.entity_count(), &labels)?;
        let series = Series::new(self.group_column.as_str().into(), labels);
        self.frame.with_column(series)?;
        Ok(())
    }
}

fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_follow_first_appearance() {
        let dataset = LabeledDataset::from_labels(strings(&["B", "A", "B", "C", "A"]));
        assert_eq!(dataset.groups().unwrap(), strings(&["B", "A", "C"]));
    }

    #[test]
    fn bulk_write_requires_one_label_per_entity() {
        let mut dataset = LabeledDataset::from_labels(strings(&["A", "B"]));
        assert!(matches!(
            dataset.set_group_labels(strings(&["A"])),
            Err(AmalgamateError::ShapeMismatch { .. })
        ));
        dataset.set_group_labels(strings(&["X", "Y"])).unwrap();
        assert_eq!(dataset.labels, strings(&["X", "Y"]));
    }

    #[test]
    fn attribute_rows_must_match_entities() {
        let result = LabeledDataset::new(
            strings(&["i1", "i2"]),
            strings(&["A", "B"]),
            Array2::zeros((3, 4)),
        );
        assert!(matches!(result, Err(AmalgamateError::ShapeMismatch { .. })));
    }

    #[test]
    fn frame_dataset_reads_and_writes_labels() {
        let frame = df!(
            "id" => ["i1", "i2", "i3"],
            "pop" => ["A", "B", "A"],
            "locus1" => [0.0, 1.0, 2.0]
        )
        .unwrap();

        let mut dataset = FrameDataset::new(frame, "pop").unwrap();
        assert_eq!(dataset.entity_count(), 3);
        assert_eq!(dataset.groups().unwrap(), strings(&["A", "B"]));

        dataset.set_group_labels(strings(&["G", "G", "A"])).unwrap();
        assert_eq!(dataset.group_labels().unwrap(), strings(&["G", "G", "A"]));
        assert_eq!(dataset.frame().width(), 3);
    }

    #[test]
    fn frame_dataset_rejects_unknown_column() {
        let frame = df!("pop" => ["A"]).unwrap();
        assert!(FrameDataset::new(frame, "population").is_err());
    }

    #[test]
    fn null_labels_need_a_default_group() {
        let frame = df!("pop" => [Some("A"), None, Some("B")]).unwrap();
        let dataset = FrameDataset::new(frame, "pop").unwrap();

        assert!(matches!(
            dataset.group_labels(),
            Err(AmalgamateError::MissingGroupLabel { entity: 1 })
        ));

        let dataset = dataset.with_default_group("pop1").unwrap();
        assert_eq!(dataset.group_labels().unwrap(), strings(&["A", "pop1", "B"]));
    }

    #[test]
    fn frame_dataset_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genotypes.csv");

        let frame = df!("id" => ["i1", "i2"], "pop" => ["A", "B"]).unwrap();
        FrameDataset::new(frame, "pop").unwrap().save(&path).unwrap();

        let loaded = FrameDataset::load(&path, "pop").unwrap();
        assert_eq!(loaded.group_labels().unwrap(), strings(&["A", "B"]));
    }
}
