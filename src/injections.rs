/*!
# Found-injection retrieval

Injection sets store one row per simulated signal in the `events` table of the
fixed `injections` group. Only injections that some search recovered above a
significance threshold are eligible for sampling: a row is *found* when at
least one significance column exceeds the threshold.

The group also carries two attributes, `analysis_time_s` and
`total_generated`, which are reported with every result.
*/

use tracing::debug;

use crate::archive::{Archive, Group, Table};
use crate::core::{extract_columns, Metadata, Samples};
use crate::error::{Error, Result};
use crate::selection::{select_from, SampleCount};

pub const INJECTIONS_GROUP: &str = "injections";
pub const INJECTION_TABLE: &str = "events";

/// Seconds in a Julian year.
pub const YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

const ANALYSIS_TIME_ATTR: &str = "analysis_time_s";
const TOTAL_GENERATED_ATTR: &str = "total_generated";

/// Which columns count as detection significance (inverse false-alarm rate).
#[derive(Debug, Clone, PartialEq)]
pub enum SignificanceColumns {
    /// Every column whose name contains this substring (case-sensitive).
    Containing(String),
    /// Exactly these columns; each must exist.
    Named(Vec<String>),
}

impl Default for SignificanceColumns {
    fn default() -> Self {
        SignificanceColumns::Containing("ifar".to_string())
    }
}

impl SignificanceColumns {
    /// Column names of `table` this selector picks, in schema order for
    /// substring matching and in the given order otherwise.
    pub fn resolve<T: Table>(&self, table: &T) -> Result<Vec<String>> {
        match self {
            SignificanceColumns::Containing(pattern) => Ok(table
                .column_names()
                .iter()
                .filter(|name| name.contains(pattern.as_str()))
                .cloned()
                .collect()),
            SignificanceColumns::Named(names) => {
                table.check_columns(names)?;
                Ok(names.clone())
            }
        }
    }
}

/// Population filter for injections.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceFilter {
    /// A row passes a column when its value is strictly greater than this.
    pub threshold: f64,
    pub columns: SignificanceColumns,
}

impl Default for SignificanceFilter {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            columns: SignificanceColumns::default(),
        }
    }
}

impl SignificanceFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, columns: SignificanceColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Marks every row that exceeds the threshold in at least one
    /// significance column. With no significance columns nothing is found.
    pub fn found_mask<T: Table>(&self, table: &T) -> Result<Vec<bool>> {
        let mut keep = vec![false; table.num_rows()];
        for name in self.columns.resolve(table)? {
            let values = table.read_column(&name)?;
            if values.len() != keep.len() {
                return Err(Error::InvalidArchive(format!(
                    "column {name} has {} rows, table declares {}",
                    values.len(),
                    keep.len()
                )));
            }
            keep.iter_mut()
                .zip(values.iter())
                .for_each(|(k, &v)| *k |= v > self.threshold);
        }
        Ok(keep)
    }
}

fn injections_group<A: Archive>(archive: &A) -> Result<A::Group> {
    archive
        .group(INJECTIONS_GROUP)?
        .ok_or_else(|| Error::InjectionsNotFound {
            filename: archive.filename().to_string(),
        })
}

/// Draws found injections.
///
/// `n_found` in the returned metadata counts rows passing `filter`, and that
/// count bounds [`SampleCount::Exactly`]. Indices are always ascending.
pub fn load_injections<A, S>(
    archive: &A,
    variables: &[S],
    count: SampleCount,
    filter: &SignificanceFilter,
    seed: Option<u64>,
) -> Result<Samples>
where
    A: Archive,
    S: AsRef<str>,
{
    let group = injections_group(archive)?;

    let mut metadata = Metadata::new(archive.filename());
    metadata.analysis_time = Some(group.require_attribute(ANALYSIS_TIME_ATTR)? / YEAR);
    metadata.total_generated = Some(group.require_attribute(TOTAL_GENERATED_ATTR)?);

    let table = group.require_table(INJECTION_TABLE)?;
    let found: Vec<usize> = filter
        .found_mask(&table)?
        .into_iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect();
    metadata.n_found = Some(found.len());

    let idxs = select_from(&found, count, seed, archive.filename())?;
    debug!(
        filename = archive.filename(),
        total = table.num_rows(),
        n_found = found.len(),
        selected = idxs.len(),
        threshold = filter.threshold,
        "selected found injections"
    );
    let samples = extract_columns(&table, variables, &idxs)?;

    Ok(Samples {
        model: INJECTIONS_GROUP.to_string(),
        idxs,
        samples,
        metadata,
    })
}

/// Column names of the injection table.
pub fn find_injection_variables<A: Archive>(archive: &A) -> Result<Vec<String>> {
    let group = injections_group(archive)?;
    let table = group.require_table(INJECTION_TABLE)?;
    Ok(table.column_names().to_vec())
}
