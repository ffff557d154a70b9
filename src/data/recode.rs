//! Applying a reassignment table to a dataset

use std::path::Path;

use crate::cluster::ReassignmentTable;
use crate::data::GroupedDataset;
use crate::error::Result;
use crate::storage;

/// Return a copy of `dataset` with group labels replaced through `table`
///
/// Labels without an exact match in the table's original column pass
/// through unchanged. The input dataset is not modified.
pub fn recode<D: GroupedDataset>(dataset: &D, table: &ReassignmentTable) -> Result<D> {
    let lookup = table.lookup();
    let mut changed = 0usize;

    let labels: Vec<String> = dataset
        .group_labels()?
        .into_iter()
        .map(|label| match lookup.get(label.as_str()) {
            Some(&new) if new != label => {
                changed += 1;
                new.to_string()
            }
            _ => label,
        })
        .collect();

    log::info!(
        "Recoded {} of {} entities",
        changed,
        dataset.entity_count()
    );

    let mut recoded = dataset.clone();
    recoded.set_group_labels(labels)?;
    Ok(recoded)
}

/// Re-read a persisted table and apply it
pub fn recode_from_path<D: GroupedDataset>(dataset: &D, path: &Path) -> Result<D> {
    let table = storage::read_table(path)?;
    recode(dataset, &table)
}
