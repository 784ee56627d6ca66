//! Process-local cache of loaded datasets, keyed by file path.
//!
//! Callers own a `DataStore` and pass it to whatever needs data; loaded
//! datasets are shared read-only through `Arc`.

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::loader::{self, LoadReport};
use crate::types::Dataset;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DataStore {
    config: LoaderConfig,
    entries: HashMap<PathBuf, Entry>,
}

#[derive(Debug)]
struct Entry {
    dataset: Arc<Dataset>,
    report: LoadReport,
}

impl DataStore {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config, entries: HashMap::new() }
    }

    /// Return the cached dataset for `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path, label: &str) -> Result<Arc<Dataset>, LoadError> {
        if let Some(entry) = self.entries.get(path) {
            debug!("cache hit for {}", path.display());
            return Ok(Arc::clone(&entry.dataset));
        }
        let (dataset, report) = loader::load_with(path, label, &self.config)?;
        let dataset = Arc::new(dataset);
        self.entries
            .insert(path.to_path_buf(), Entry { dataset: Arc::clone(&dataset), report });
        Ok(dataset)
    }

    /// Diagnostics from the load that populated `path`, if cached.
    pub fn load_report(&self, path: &Path) -> Option<&LoadReport> {
        self.entries.get(path).map(|e| &e.report)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Forget `path`; the next `get_or_load` reads the file again.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            info!("invalidated cached dataset {}", path.display());
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
