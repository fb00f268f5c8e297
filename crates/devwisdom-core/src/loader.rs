use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{SourceCache, SourceMap};
use crate::error::WisdomError;

const SOURCES_FILE: &str = "sources.json";

/// Ordered list of `sources.json` locations. Later files win per source id.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    paths: Vec<PathBuf>,
}

impl SourceLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Working directory candidates, then the home and config directories,
    /// then `extra` in the order given.
    pub fn standard(extra: Vec<PathBuf>) -> Self {
        let mut paths = vec![
            PathBuf::from(SOURCES_FILE),
            Path::new("wisdom").join(SOURCES_FILE),
            Path::new(".wisdom").join(SOURCES_FILE),
        ];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".wisdom").join(SOURCES_FILE));
        }
        if let Some(config) = dirs::config_dir() {
            paths.push(config.join("wisdom").join(SOURCES_FILE));
        }
        paths.extend(extra);
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Loads every readable file through `cache`, skipping the rest.
    pub fn overlays(&self, cache: &SourceCache) -> Vec<Arc<SourceMap>> {
        let mut out = Vec::new();
        for path in &self.paths {
            match cache.load(path) {
                Ok(sources) => out.push(sources),
                Err(WisdomError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
                Err(err) => tracing::warn!("skipping sources file: {err}"),
            }
        }
        out
    }

    /// Merged view of all overlay files.
    pub fn load(&self, cache: &SourceCache) -> SourceMap {
        let mut merged = BTreeMap::new();
        for sources in self.overlays(cache) {
            for (id, source) in sources.iter() {
                merged.insert(id.clone(), source.clone());
            }
        }
        merged
    }
}
