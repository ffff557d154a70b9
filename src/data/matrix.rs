//! Labeled distance matrix loading and validation

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ndarray::Array2;
use polars::prelude::*;

use crate::error::{AmalgamateError, Result};

/// Square, symmetric matrix of pairwise group distances
///
/// Only one triangle of the input is authoritative. For every pair the lower
/// triangle value is used when present; a missing (NaN) lower value is filled
/// from the upper triangle, so lower-only and upper-only inputs normalize to
/// the same matrix. The diagonal always reads as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Build a matrix from group labels and row vectors
    pub fn from_rows(labels: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();

        if rows.len() != n {
            return Err(AmalgamateError::shape(
                format!("{n} rows"),
                format!("{} rows", rows.len()),
            ));
        }

        let mut flat = Vec::with_capacity(n * n);
        for (label, row) in labels.iter().zip(&rows) {
            if row.len() != n {
                return Err(AmalgamateError::shape(
                    format!("{n} columns in row '{label}'"),
                    format!("{} columns", row.len()),
                ));
            }
            flat.extend_from_slice(row);
        }

        let values = Array2::from_shape_vec((n, n), flat)
            .map_err(|e| AmalgamateError::shape(format!("{n}x{n} matrix"), e.to_string()))?;

        Self::from_array(labels, values)
    }

    /// Build a matrix from group labels and a dense array
    pub fn from_array(labels: Vec<String>, values: Array2<f64>) -> Result<Self> {
        let n = labels.len();

        if values.nrows() != values.ncols() {
            return Err(AmalgamateError::shape(
                "a square matrix",
                format!("{}x{}", values.nrows(), values.ncols()),
            ));
        }
        if values.nrows() != n {
            return Err(AmalgamateError::shape(
                format!("{n}x{n} matrix for {n} labels"),
                format!("{}x{}", values.nrows(), values.ncols()),
            ));
        }

        let mut seen = HashSet::with_capacity(n);
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(AmalgamateError::shape(
                    "unique group labels",
                    format!("duplicate label '{label}'"),
                ));
            }
        }

        let mut symmetric = Array2::zeros((n, n));
        let mut missing = 0usize;

        for i in 0..n {
            for j in 0..i {
                let lower = values[[i, j]];
                let value = if lower.is_nan() { values[[j, i]] } else { lower };
                if value.is_nan() {
                    missing += 1;
                } else if value < 0.0 {
                    return Err(AmalgamateError::InvalidDistance {
                        first: labels[i].clone(),
                        second: labels[j].clone(),
                        value,
                    });
                }
                symmetric[[i, j]] = value;
                symmetric[[j, i]] = value;
            }
        }

        if missing > 0 {
            log::warn!(
                "{} group pairs have no distance in either triangle and will never be linked",
                missing
            );
        }

        Ok(Self {
            labels,
            values: symmetric,
        })
    }

    /// Read a labeled matrix from a CSV file
    ///
    /// The header row carries the column labels after an ignored first cell;
    /// every following row starts with its row label. Empty or non-numeric
    /// cells are read as missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading distance matrix: {}", path.display());

        if !path.exists() {
            return Err(AmalgamateError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )));
        }

        // Read every cell as text so numeric-looking labels survive intact
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let (label_column, value_columns) = frame
            .get_columns()
            .split_first()
            .ok_or_else(|| AmalgamateError::shape("a labeled header row", "an empty file"))?;

        let column_labels: Vec<String> = value_columns
            .iter()
            .map(|column| column.name().to_string())
            .collect();

        let row_labels: Vec<String> = label_column
            .str()?
            .into_iter()
            .map(|label| label.unwrap_or_default().to_string())
            .collect();

        let n = column_labels.len();

        // Rows may list the groups in any order; index them by label
        let row_of: HashMap<&str, usize> = row_labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.as_str(), idx))
            .collect();

        let mut sorted_rows = row_labels.clone();
        let mut sorted_columns = column_labels.clone();
        sorted_rows.sort();
        sorted_columns.sort();

        if row_of.len() != row_labels.len() || sorted_rows != sorted_columns {
            return Err(AmalgamateError::shape(
                format!("row labels matching column labels {:?}", column_labels),
                format!("{:?}", row_labels),
            ));
        }

        let mut values = Array2::from_elem((n, n), f64::NAN);

        for (j, column) in value_columns.iter().enumerate() {
            let numeric = column.cast(&DataType::Float64)?;
            let numeric = numeric.f64()?;
            for (i, label) in column_labels.iter().enumerate() {
                if let Some(value) = numeric.get(row_of[label.as_str()]) {
                    values[[i, j]] = value;
                }
            }
        }

        log::info!("Loaded {}x{} distance matrix", n, n);

        Self::from_array(column_labels, values)
    }

    /// Reorder the matrix to follow `groups`
    ///
    /// `groups` must be a permutation of the matrix labels.
    pub fn aligned_to(&self, groups: &[String]) -> Result<Self> {
        if groups.len() != self.len() {
            return Err(AmalgamateError::shape(
                format!("{} groups in the distance matrix", groups.len()),
                format!("{} groups", self.len()),
            ));
        }

        let positions: HashMap<&str, usize> = self
            .labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.as_str(), idx))
            .collect();

        let mut order = Vec::with_capacity(groups.len());
        let mut used = vec![false; groups.len()];

        for group in groups {
            match positions.get(group.as_str()) {
                Some(&idx) if !used[idx] => {
                    used[idx] = true;
                    order.push(idx);
                }
                _ => {
                    return Err(AmalgamateError::shape(
                        format!("matrix labels {:?}", self.labels),
                        format!("dataset group '{group}'"),
                    ))
                }
            }
        }

        let values = Array2::from_shape_fn((order.len(), order.len()), |(i, j)| {
            self.values[[order[i], order[j]]]
        });

        Ok(Self {
            labels: groups.to_vec(),
            values,
        })
    }

    /// Distance between groups `i` and `j`; 0 on the diagonal
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            0.0
        } else {
            self.values[[i, j]]
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
