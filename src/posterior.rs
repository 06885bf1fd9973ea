//! Retrieval of posterior samples for a named model.

use tracing::debug;

use crate::archive::{Archive, Group, Table};
use crate::core::{extract_columns, Metadata, Samples};
use crate::error::{Error, Result};
use crate::selection::{select, SampleCount};

/// Name of the table holding a model's posterior samples.
pub const POSTERIOR_TABLE: &str = "posterior_samples";

fn model_group<A: Archive>(archive: &A, model: &str) -> Result<A::Group> {
    match archive.group(model)? {
        Some(group) => Ok(group),
        None => Err(Error::ModelNotFound {
            model: model.to_string(),
            filename: archive.filename().to_string(),
            available: archive.group_names()?,
        }),
    }
}

/// Draws posterior samples of `variables` for `model`.
///
/// With [`SampleCount::All`] the indices are every row in order; otherwise a
/// seeded draw without replacement whose order is that of the generator.
pub fn load_posterior<A, S>(
    archive: &A,
    model: &str,
    variables: &[S],
    count: SampleCount,
    seed: Option<u64>,
) -> Result<Samples>
where
    A: Archive,
    S: AsRef<str>,
{
    let group = model_group(archive, model)?;
    let table = group.require_table(POSTERIOR_TABLE)?;

    let total = table.num_rows();
    let idxs = select(total, count, seed, archive.filename())?;
    debug!(
        filename = archive.filename(),
        model,
        total,
        selected = idxs.len(),
        "selected posterior samples"
    );
    let samples = extract_columns(&table, variables, &idxs)?;

    Ok(Samples {
        model: model.to_string(),
        idxs,
        samples,
        metadata: Metadata::new(archive.filename()),
    })
}

/// Lists what can be requested for `model`.
///
/// These are the posterior table's columns when the model has one, and the
/// names of its sub-groups otherwise.
pub fn find_variables<A: Archive>(archive: &A, model: &str) -> Result<Vec<String>> {
    let group = model_group(archive, model)?;
    match group.table(POSTERIOR_TABLE)? {
        Some(table) => Ok(table.column_names().to_vec()),
        None => group.subgroup_names(),
    }
}
