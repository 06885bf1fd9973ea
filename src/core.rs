use std::collections::BTreeMap;

use ndarray::Axis;
use serde::Serialize;

use crate::archive::Table;
use crate::error::{Error, Result};

/// Auxiliary scalars attached to a retrieval.
///
/// Posterior retrievals only fill `filename`; injection retrievals fill all of
/// them. Unset fields are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_generated: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_found: Option<usize>,
}

impl Metadata {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            analysis_time: None,
            total_generated: None,
            n_found: None,
        }
    }
}

/// The outcome of a sampling query.
///
/// `samples[v][i]` is the value of column `v` at row `idxs[i]`, for every
/// requested `v`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Samples {
    pub model: String,
    pub idxs: Vec<usize>,
    pub samples: BTreeMap<String, Vec<f64>>,
    pub metadata: Metadata,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.idxs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idxs.is_empty()
    }
}

/// Gathers `variables` at rows `idxs`.
///
/// The whole request is checked against the schema before any column is
/// read, so an unknown name never leaves a partly filled map behind.
pub fn extract_columns<T, S>(
    table: &T,
    variables: &[S],
    idxs: &[usize],
) -> Result<BTreeMap<String, Vec<f64>>>
where
    T: Table,
    S: AsRef<str>,
{
    table.check_columns(variables)?;
    let mut samples = BTreeMap::new();
    for variable in variables {
        let variable = variable.as_ref();
        if samples.contains_key(variable) {
            continue;
        }
        let column = table.read_column(variable)?;
        if column.len() != table.num_rows() {
            return Err(Error::InvalidArchive(format!(
                "column {variable} has {} rows, table declares {}",
                column.len(),
                table.num_rows()
            )));
        }
        samples.insert(
            variable.to_string(),
            column.select(Axis(0), idxs).to_vec(),
        );
    }
    Ok(samples)
}
