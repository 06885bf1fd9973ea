//! End-to-end retrieval from archives written to disk in the Parquet layout.

use std::collections::HashSet;
use std::path::Path;

use gw_samples::archive::parquet::save_archive;
use gw_samples::archive::{MemoryArchive, MemoryGroup, MemoryTable, ParquetArchive};
use gw_samples::injections::{
    load_injections, SignificanceColumns, SignificanceFilter, INJECTIONS_GROUP, INJECTION_TABLE,
    YEAR,
};
use gw_samples::posterior::{find_variables, load_posterior, POSTERIOR_TABLE};
use gw_samples::{Error, SampleCount};
use tempfile::TempDir;

const MODEL: &str = "C01:IMRPhenomXPHM";

fn write_injections(root: &Path, ifar_2: Vec<f64>) -> ParquetArchive {
    let table = MemoryTable::from_columns([
        ("mass", (0..10).map(|i| 1.5 * i as f64).collect::<Vec<f64>>()),
        (
            "ifar_1",
            vec![0.0, 2.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 9.0],
        ),
        ("ifar_2", ifar_2),
    ])
    .unwrap();
    let archive = MemoryArchive::new("unused").with_group(
        MemoryGroup::new(INJECTIONS_GROUP)
            .with_attribute("analysis_time_s", 0.5 * YEAR)
            .with_attribute("total_generated", 12345.0)
            .with_table(INJECTION_TABLE, table),
    );
    let path = root.join("o3-test.samples");
    save_archive(&archive, &path).unwrap();
    ParquetArchive::open(&path).unwrap()
}

fn write_posterior(root: &Path, rows: usize) -> ParquetArchive {
    let table = MemoryTable::from_columns([
        ("mass_1", (0..rows).map(|i| i as f64).collect::<Vec<f64>>()),
        ("redshift", (0..rows).map(|i| 0.001 * i as f64).collect()),
    ])
    .unwrap();
    let archive = MemoryArchive::new("unused")
        .with_group(MemoryGroup::new(MODEL).with_table(POSTERIOR_TABLE, table));
    let path = root.join("GW150914_095045.samples");
    save_archive(&archive, &path).unwrap();
    ParquetArchive::open(&path).unwrap()
}

#[test]
fn test_found_injections_end_to_end() {
    let dir = TempDir::new().unwrap();
    let archive = write_injections(
        dir.path(),
        vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0],
    );
    let filter = SignificanceFilter::new(1.0);

    let all = load_injections(&archive, &["mass"], SampleCount::All, &filter, None).unwrap();
    assert_eq!(all.idxs, vec![1, 4, 6, 9]);
    assert_eq!(all.metadata.n_found, Some(4));
    assert_eq!(all.metadata.total_generated, Some(12345.0));
    assert!((all.metadata.analysis_time.unwrap() - 0.5).abs() < 1e-12);
    assert_eq!(all.metadata.filename, "o3-test.samples");

    let drawn =
        load_injections(&archive, &["mass"], SampleCount::Exactly(2), &filter, Some(42)).unwrap();
    let again =
        load_injections(&archive, &["mass"], SampleCount::Exactly(2), &filter, Some(42)).unwrap();
    assert_eq!(drawn, again);
    assert_eq!(drawn.idxs.len(), 2);
    assert!(drawn.idxs[0] < drawn.idxs[1]);
    assert!(drawn.idxs.iter().all(|i| [1, 4, 6, 9].contains(i)));
    let expected: Vec<f64> = drawn.idxs.iter().map(|&i| 1.5 * i as f64).collect();
    assert_eq!(drawn.samples["mass"], expected);

    assert!(matches!(
        load_injections(&archive, &["mass"], SampleCount::Exactly(5), &filter, Some(42)),
        Err(Error::InsufficientSamples {
            requested: 5,
            available: 4,
            ..
        })
    ));
}

/// A row is found iff at least one of the two IFAR columns exceeds the threshold.
#[test]
fn test_found_mask_is_logical_or() {
    let dir = TempDir::new().unwrap();
    let ifar_2 = vec![3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0];
    let archive = write_injections(dir.path(), ifar_2.clone());
    let ifar_1 = [0.0, 2.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 9.0];

    for threshold in [-1.0, 0.0, 1.0, 2.0, 4.0, 8.0, 10.0] {
        let filter = SignificanceFilter::new(threshold);
        let result = load_injections(&archive, &["ifar_1"], SampleCount::All, &filter, None).unwrap();
        let expected: Vec<usize> = (0..10)
            .filter(|&i| ifar_1[i] > threshold || ifar_2[i] > threshold)
            .collect();
        assert_eq!(result.idxs, expected, "threshold {threshold}");
        assert_eq!(result.metadata.n_found, Some(expected.len()));
    }
}

#[test]
fn test_explicit_significance_columns_on_disk() {
    let dir = TempDir::new().unwrap();
    let archive = write_injections(
        dir.path(),
        vec![3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0],
    );
    let filter = SignificanceFilter::new(1.0)
        .with_columns(SignificanceColumns::Named(vec!["ifar_1".to_string()]));
    let result = load_injections(&archive, &["mass"], SampleCount::All, &filter, None).unwrap();
    assert_eq!(result.idxs, vec![1, 4, 9]);
}

#[test]
fn test_posterior_extraction_alignment_on_disk() {
    let dir = TempDir::new().unwrap();
    let archive = write_posterior(dir.path(), 1000);

    for seed in [1, 2, 3] {
        let result = load_posterior(
            &archive,
            MODEL,
            &["mass_1", "redshift"],
            SampleCount::Exactly(100),
            Some(seed),
        )
        .unwrap();
        assert_eq!(result.idxs.len(), 100);
        assert_eq!(result.idxs.iter().collect::<HashSet<_>>().len(), 100);
        for (i, &idx) in result.idxs.iter().enumerate() {
            assert_eq!(result.samples["mass_1"][i], idx as f64);
            assert_eq!(result.samples["redshift"][i], 0.001 * idx as f64);
        }
    }

    let all = load_posterior(&archive, MODEL, &["mass_1"], SampleCount::All, Some(5)).unwrap();
    assert_eq!(all.idxs, (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_posterior_failures_on_disk() {
    let dir = TempDir::new().unwrap();
    let archive = write_posterior(dir.path(), 10);

    assert!(matches!(
        load_posterior(&archive, "C01:Mixed", &["mass_1"], SampleCount::All, None),
        Err(Error::ModelNotFound { ref available, .. }) if available == &vec![MODEL.to_string()]
    ));
    assert!(matches!(
        load_posterior(&archive, MODEL, &["mass_1"], SampleCount::Exactly(11), None),
        Err(Error::InsufficientSamples { .. })
    ));
    match load_posterior(&archive, MODEL, &["mass_1", "spin_1"], SampleCount::All, None) {
        Err(Error::VariableNotFound {
            variable,
            available,
        }) => {
            assert_eq!(variable, "spin_1");
            assert_eq!(available, vec!["mass_1", "redshift"]);
        }
        other => panic!("expected VariableNotFound, got {other:?}"),
    }
    assert!(matches!(
        load_injections(
            &archive,
            &["mass_1"],
            SampleCount::All,
            &SignificanceFilter::default(),
            None
        ),
        Err(Error::InjectionsNotFound { .. })
    ));
    assert_eq!(
        find_variables(&archive, MODEL).unwrap(),
        vec!["mass_1", "redshift"]
    );
}
