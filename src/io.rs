/*!
# Exporting retrieval results

Writes a [`Samples`] result as CSV. Enable via the `csv` feature.
*/

use std::io::Write;

use csv::Writer;

use crate::core::Samples;

/// Writes a retrieval result as CSV.
///
/// The header row is `"idx"` followed by one column per variable in
/// alphabetical order; each following row is one selected record.
///
/// # Arguments
///
/// * `samples` - The result to export.
/// * `writer` - Destination, e.g. a file or `std::io::stdout()`.
///
/// # Returns
///
/// Returns `Ok(())` if successful, or an error if any I/O or CSV formatting
/// issue occurs.
///
/// # Examples
///
/// ```rust
/// use gw_samples::archive::{MemoryArchive, MemoryGroup, MemoryTable};
/// use gw_samples::io::write_csv;
/// use gw_samples::posterior::load_posterior;
/// use gw_samples::selection::SampleCount;
///
/// let table = MemoryTable::from_columns([("mass_1", vec![30.0, 35.0])])?;
/// let archive = MemoryArchive::new("demo")
///     .with_group(MemoryGroup::new("model").with_table("posterior_samples", table));
/// let samples = load_posterior(&archive, "model", &["mass_1"], SampleCount::All, None)?;
///
/// let mut out = Vec::new();
/// write_csv(&samples, &mut out)?;
/// assert_eq!(String::from_utf8(out)?, "idx,mass_1\n0,30\n1,35\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_csv<W: Write>(samples: &Samples, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut header: Vec<&str> = vec!["idx"];
    header.extend(samples.samples.keys().map(String::as_str));
    wtr.write_record(&header)?;

    for (row, idx) in samples.idxs.iter().enumerate() {
        let mut record = vec![idx.to_string()];
        record.extend(samples.samples.values().map(|column| column[row].to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
