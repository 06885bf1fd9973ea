//! An owned, in-memory archive.
//!
//! Used to build fixtures and synthetic sample sets; [`crate::archive::parquet::save_archive`]
//! writes one to disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::Array1;

use super::{Archive, Group, Table};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    filename: String,
    groups: BTreeMap<String, MemoryGroup>,
}

impl MemoryArchive {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            groups: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a top-level group.
    pub fn with_group(mut self, group: MemoryGroup) -> Self {
        self.groups.insert(group.name.clone(), group);
        self
    }

    pub fn groups(&self) -> impl Iterator<Item = &MemoryGroup> {
        self.groups.values()
    }
}

impl Archive for MemoryArchive {
    type Group = MemoryGroup;

    fn filename(&self) -> &str {
        &self.filename
    }

    fn group_names(&self) -> Result<Vec<String>> {
        Ok(self.groups.keys().cloned().collect())
    }

    fn group(&self, name: &str) -> Result<Option<MemoryGroup>> {
        Ok(self.groups.get(name).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGroup {
    name: String,
    attributes: BTreeMap<String, f64>,
    tables: BTreeMap<String, MemoryTable>,
    subgroups: BTreeMap<String, MemoryGroup>,
}

impl MemoryGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, table: MemoryTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn with_subgroup(mut self, group: MemoryGroup) -> Self {
        self.subgroups.insert(group.name.clone(), group);
        self
    }

    pub fn attributes(&self) -> &BTreeMap<String, f64> {
        &self.attributes
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &MemoryTable)> {
        self.tables.iter()
    }

    pub fn subgroups(&self) -> impl Iterator<Item = &MemoryGroup> {
        self.subgroups.values()
    }
}

impl Group for MemoryGroup {
    type Table = MemoryTable;

    fn name(&self) -> &str {
        &self.name
    }

    fn subgroup_names(&self) -> Result<Vec<String>> {
        Ok(self.subgroups.keys().cloned().collect())
    }

    fn table(&self, name: &str) -> Result<Option<MemoryTable>> {
        Ok(self.tables.get(name).cloned())
    }

    fn attribute(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.attributes.get(name).copied())
    }
}

/// Columns share their buffers between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    names: Vec<String>,
    columns: Arc<Vec<Array1<f64>>>,
    num_rows: usize,
}

impl MemoryTable {
    /// Builds a table from `(name, values)` pairs in schema order.
    ///
    /// All columns must have the same length and names must be unique.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        let mut data = Vec::new();
        for (name, values) in columns {
            let name = name.into();
            if names.contains(&name) {
                return Err(Error::InvalidArchive(format!("duplicate column {name}")));
            }
            if let Some(first) = data.first().map(|c: &Array1<f64>| c.len()) {
                if values.len() != first {
                    return Err(Error::InvalidArchive(format!(
                        "column {name} has {} rows, expected {first}",
                        values.len()
                    )));
                }
            }
            names.push(name);
            data.push(Array1::from(values));
        }
        let num_rows = data.first().map_or(0, |c| c.len());
        Ok(Self {
            names,
            columns: Arc::new(data),
            num_rows,
        })
    }
}

impl Table for MemoryTable {
    fn column_names(&self) -> &[String] {
        &self.names
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn read_column(&self, name: &str) -> Result<Array1<f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].clone())
            .ok_or_else(|| self.missing_column(name))
    }
}
