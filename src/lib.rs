//! # gw-samples
//!
//! Reproducible, random-access subsets of gravitational-wave posterior samples
//! and found injections, read from hierarchical sample archives.
//!
//! ## Example
//!
//! ```rust
//! use gw_samples::archive::{MemoryArchive, MemoryGroup, MemoryTable};
//! use gw_samples::posterior::load_posterior;
//! use gw_samples::selection::SampleCount;
//!
//! let table = MemoryTable::from_columns([
//!     ("mass_1", vec![35.6, 30.1, 38.9, 33.0]),
//!     ("mass_2", vec![30.6, 28.2, 27.4, 31.9]),
//! ])?;
//! let archive = MemoryArchive::new("GW150914_095045.samples").with_group(
//!     MemoryGroup::new("C01:IMRPhenomXPHM").with_table("posterior_samples", table),
//! );
//!
//! let result = load_posterior(
//!     &archive,
//!     "C01:IMRPhenomXPHM",
//!     &["mass_1"],
//!     SampleCount::Exactly(2),
//!     Some(42),
//! )?;
//! assert_eq!(result.idxs.len(), 2);
//! assert_eq!(result.samples["mass_1"].len(), 2);
//! # Ok::<(), gw_samples::Error>(())
//! ```

pub mod archive;
pub mod catalog;
pub mod core;
pub mod error;
pub mod injections;
#[cfg(feature = "csv")]
pub mod io;
pub mod posterior;
pub mod selection;
#[cfg(feature = "parquet")]
pub mod server;

pub use crate::core::{Metadata, Samples};
pub use error::{Error, Result};
pub use selection::SampleCount;
