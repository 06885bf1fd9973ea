//! Name → archive lookup, built once from a samples directory.
//!
//! ```text
//! <root>/events/<set>/<archive>        named by the GWYYMMDD_NNNNNN tag in the archive name
//! <root>/injections/<set>/<archive>    named by the archive name up to the first '-'
//! ```
//!
//! A [`Catalog`] is never mutated after [`Catalog::scan`]; share it behind an
//! `Arc`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::Result;

pub const EVENTS_DIR: &str = "events";
pub const INJECTIONS_DIR: &str = "injections";

fn event_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"GW\d{6}_\d+").expect("event name pattern is valid"))
}

/// Extracts the event name (e.g. `GW150914_095045`) from an archive name.
pub fn event_name(archive_name: &str) -> Option<&str> {
    event_pattern().find(archive_name).map(|m| m.as_str())
}

/// The injection set name: everything before the first `-`.
pub fn injection_set_name(archive_name: &str) -> &str {
    archive_name.split('-').next().unwrap_or(archive_name)
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    events: BTreeMap<String, PathBuf>,
    injections: BTreeMap<String, PathBuf>,
}

/// Calls `f` with each entry of every sub-directory of `dir`.
fn for_each_archive(dir: &Path, mut f: impl FnMut(&str, PathBuf)) -> Result<()> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "sample directory missing, nothing to index");
        return Ok(());
    }
    let mut sets: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    sets.sort();
    for set in sets.into_iter().filter(|p| p.is_dir()) {
        let mut archives: Vec<PathBuf> = fs::read_dir(&set)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        archives.sort();
        for path in archives {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            f(&name, path);
        }
    }
    Ok(())
}

fn insert(map: &mut BTreeMap<String, PathBuf>, kind: &str, name: &str, path: PathBuf) {
    if let Some(previous) = map.insert(name.to_string(), path) {
        warn!(
            kind,
            name,
            replaced = %previous.display(),
            "duplicate catalog entry, keeping the later one"
        );
    }
}

impl Catalog {
    /// Indexes `root/events` and `root/injections`.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut catalog = Catalog::default();

        for_each_archive(&root.join(EVENTS_DIR), |name, path| match event_name(name) {
            Some(event) => insert(&mut catalog.events, "event", event, path),
            None => warn!(path = %path.display(), "no event name in archive name, skipping"),
        })?;
        for_each_archive(&root.join(INJECTIONS_DIR), |name, path| {
            insert(
                &mut catalog.injections,
                "injection set",
                injection_set_name(name),
                path,
            )
        })?;

        info!(
            root = %root.display(),
            events = catalog.events.len(),
            injection_sets = catalog.injections.len(),
            "sample catalog built"
        );
        Ok(catalog)
    }

    /// Builds a catalog from explicit entries.
    pub fn from_entries<E, I>(events: E, injections: I) -> Self
    where
        E: IntoIterator<Item = (String, PathBuf)>,
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        Self {
            events: events.into_iter().collect(),
            injections: injections.into_iter().collect(),
        }
    }

    pub fn event_path(&self, event: &str) -> Option<&Path> {
        self.events.get(event).map(PathBuf::as_path)
    }

    pub fn injection_path(&self, set: &str) -> Option<&Path> {
        self.injections.get(set).map(PathBuf::as_path)
    }

    /// Event names, sorted.
    pub fn events(&self) -> Vec<String> {
        self.events.keys().cloned().collect()
    }

    /// Injection set names, sorted.
    pub fn injection_sets(&self) -> Vec<String> {
        self.injections.keys().cloned().collect()
    }
}
