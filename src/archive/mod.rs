/*!
# Hierarchical sample archives

An archive is a tree of named groups. Groups hold scalar attributes, nested
groups and tables; a table is a set of equal-length numeric columns that are
read lazily, one column at a time.

Two backends are provided:
- [`memory::MemoryArchive`], an owned in-memory tree, and
- [`parquet::ParquetArchive`] (feature `parquet`), a directory tree with one
  Parquet file per table.

Retrieval code is generic over [`Archive`] so that it never depends on the
storage format.
*/

use ndarray::Array1;

use crate::error::{Error, Result};

pub mod memory;
#[cfg(feature = "parquet")]
pub mod parquet;

pub use memory::{MemoryArchive, MemoryGroup, MemoryTable};
#[cfg(feature = "parquet")]
pub use parquet::ParquetArchive;

/// One hierarchical file.
pub trait Archive {
    type Group: Group;

    /// Name reported in result metadata and error messages.
    fn filename(&self) -> &str;

    /// Names of the top-level groups, sorted.
    fn group_names(&self) -> Result<Vec<String>>;

    /// Opens a top-level group, or `None` if there is no group of that name.
    fn group(&self, name: &str) -> Result<Option<Self::Group>>;
}

/// A named node of an archive.
pub trait Group {
    type Table: Table;

    fn name(&self) -> &str;

    /// Names of the immediate sub-groups, sorted.
    fn subgroup_names(&self) -> Result<Vec<String>>;

    /// Opens the named table held directly by this group.
    fn table(&self, name: &str) -> Result<Option<Self::Table>>;

    /// Reads a scalar attribute.
    fn attribute(&self, name: &str) -> Result<Option<f64>>;

    /// Like [`Group::table`], but a missing table is an error.
    fn require_table(&self, name: &str) -> Result<Self::Table> {
        self.table(name)?.ok_or_else(|| Error::DatasetNotFound {
            group: self.name().to_string(),
            dataset: name.to_string(),
        })
    }

    /// Like [`Group::attribute`], but a missing attribute is an error.
    fn require_attribute(&self, name: &str) -> Result<f64> {
        self.attribute(name)?.ok_or_else(|| Error::AttributeNotFound {
            group: self.name().to_string(),
            attribute: name.to_string(),
        })
    }
}

/// Equal-length numeric columns with a declared schema.
pub trait Table {
    /// Column names in schema order. Available without reading any data.
    fn column_names(&self) -> &[String];

    fn num_rows(&self) -> usize;

    /// Reads a whole column. Fails with [`Error::VariableNotFound`] when the
    /// schema does not declare `name`.
    fn read_column(&self, name: &str) -> Result<Array1<f64>>;

    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| c == name)
    }

    /// Fails with [`Error::VariableNotFound`] for the first name the schema
    /// does not declare.
    fn check_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(self.missing_column(missing.as_ref())),
            None => Ok(()),
        }
    }

    fn missing_column(&self, name: &str) -> Error {
        Error::VariableNotFound {
            variable: name.to_string(),
            available: self.column_names().to_vec(),
        }
    }
}
