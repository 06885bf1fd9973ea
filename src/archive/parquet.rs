/*!
# Parquet-directory archives

An archive is a directory; the directory name is the archive's filename.

```text
<archive>/
  <group>/
    attrs.json          scalar attributes, a JSON object of numbers (optional)
    <table>.parquet     one table; every column numeric
    <subgroup>/
```

Opening a table reads only the Parquet footer. Columns are decoded on demand
with a single-column projection and cast to `f64`.
*/

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use ndarray::Array1;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::file::properties::WriterProperties;

use super::{Archive, Group, MemoryArchive, MemoryGroup, Table};
use crate::error::{Error, Result};

const ATTRIBUTES_FILE: &str = "attrs.json";
const TABLE_EXTENSION: &str = "parquet";

/// Sorted names of the sub-directories of `dir`.
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
pub struct ParquetArchive {
    root: PathBuf,
    filename: String,
}

impl ParquetArchive {
    /// Opens the archive rooted at `path`, which must be a directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !fs::metadata(&root)?.is_dir() {
            return Err(Error::InvalidArchive(format!(
                "{} is not an archive directory",
                root.display()
            )));
        }
        let filename = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Ok(Self { root, filename })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Archive for ParquetArchive {
    type Group = ParquetGroup;

    fn filename(&self) -> &str {
        &self.filename
    }

    fn group_names(&self) -> Result<Vec<String>> {
        subdirectories(&self.root)
    }

    fn group(&self, name: &str) -> Result<Option<ParquetGroup>> {
        ParquetGroup::open(self.root.join(name), name)
    }
}

#[derive(Debug, Clone)]
pub struct ParquetGroup {
    path: PathBuf,
    name: String,
}

impl ParquetGroup {
    fn open(path: PathBuf, name: &str) -> Result<Option<Self>> {
        // Reject names that would escape the group directory.
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Ok(None);
        }
        if !path.is_dir() {
            return Ok(None);
        }
        Ok(Some(Self {
            path,
            name: name.to_string(),
        }))
    }

    fn read_attributes(&self) -> Result<BTreeMap<String, f64>> {
        let path = self.path.join(ATTRIBUTES_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

impl Group for ParquetGroup {
    type Table = ParquetTable;

    fn name(&self) -> &str {
        &self.name
    }

    fn subgroup_names(&self) -> Result<Vec<String>> {
        subdirectories(&self.path)
    }

    fn table(&self, name: &str) -> Result<Option<ParquetTable>> {
        if name.is_empty() || name.contains('/') {
            return Ok(None);
        }
        let path = self.path.join(format!("{name}.{TABLE_EXTENSION}"));
        if !path.is_file() {
            return Ok(None);
        }
        ParquetTable::open(path).map(Some)
    }

    fn attribute(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.read_attributes()?.get(name).copied())
    }
}

#[derive(Debug, Clone)]
pub struct ParquetTable {
    path: PathBuf,
    names: Vec<String>,
    num_rows: usize,
}

impl ParquetTable {
    /// Reads the footer only: schema and row count.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?;
        let names = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let num_rows = usize::try_from(builder.metadata().file_metadata().num_rows())
            .map_err(|_| Error::InvalidArchive(format!("negative row count in {}", path.display())))?;
        Ok(Self {
            path,
            names,
            num_rows,
        })
    }
}

impl Table for ParquetTable {
    fn column_names(&self) -> &[String] {
        &self.names
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn read_column(&self, name: &str) -> Result<Array1<f64>> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| self.missing_column(name))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), [index]);
        let reader = builder.with_projection(mask).build()?;

        let mut values = Vec::with_capacity(self.num_rows);
        for batch in reader {
            let batch = batch?;
            let column = batch.column(0);
            if !column.data_type().is_numeric() {
                return Err(Error::InvalidArchive(format!(
                    "column {name} in {} has non-numeric type {}",
                    self.path.display(),
                    column.data_type()
                )));
            }
            if column.null_count() > 0 {
                return Err(Error::InvalidArchive(format!(
                    "column {name} in {} contains nulls",
                    self.path.display()
                )));
            }
            let column = cast(column, &DataType::Float64)?;
            let column = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    Error::InvalidArchive(format!("column {name} could not be read as f64"))
                })?;
            values.extend_from_slice(column.values());
        }
        Ok(Array1::from(values))
    }
}

/// Writes one table as a Parquet file of `Float64` columns.
pub fn write_table(path: &Path, table: &impl Table) -> Result<()> {
    let fields: Vec<Field> = table
        .column_names()
        .iter()
        .map(|name| Field::new(name, DataType::Float64, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let mut arrays = Vec::with_capacity(table.column_names().len());
    for name in table.column_names() {
        let column = table.read_column(name)?;
        arrays.push(Arc::new(Float64Array::from(column.to_vec())) as ArrayRef);
    }
    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn save_group(dir: &Path, group: &MemoryGroup) -> Result<()> {
    fs::create_dir_all(dir)?;
    if !group.attributes().is_empty() {
        let file = File::create(dir.join(ATTRIBUTES_FILE))?;
        serde_json::to_writer_pretty(file, group.attributes())?;
    }
    for (name, table) in group.tables() {
        write_table(&dir.join(format!("{name}.{TABLE_EXTENSION}")), table)?;
    }
    for subgroup in group.subgroups() {
        save_group(&dir.join(subgroup.name()), subgroup)?;
    }
    Ok(())
}

/// Persists an in-memory archive under `root` using the directory layout.
///
/// `root` is created if needed; its name becomes the filename seen by readers.
pub fn save_archive(archive: &MemoryArchive, root: &Path) -> Result<()> {
    fs::create_dir_all(root)?;
    for group in archive.groups() {
        save_group(&root.join(group.name()), group)?;
    }
    Ok(())
}
