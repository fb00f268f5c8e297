use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};

use crate::advisors::{AdvisorInfo, AdvisorRegistry, SelectorKind};
use crate::cache::{SourceCache, SourceMap};
use crate::error::WisdomError;
use crate::levels::AeonLevel;
use crate::loader::SourceLoader;
use crate::provider::{SourceSummary, WisdomProvider, RANDOM_SOURCE};
use crate::sources::{builtin_sources, Quote, Source};

/// Built-in sources overlaid by user `sources.json` files.
///
/// Overlay files are read through the engine's own [`SourceCache`], so
/// edits are picked up once the TTL expires or the file's mtime changes.
#[derive(Debug)]
pub struct WisdomEngine {
    builtin: SourceMap,
    advisors: AdvisorRegistry,
    loader: SourceLoader,
    cache: SourceCache,
}

impl WisdomEngine {
    pub fn new(loader: SourceLoader, cache_ttl: Duration) -> Self {
        Self::with_sources(builtin_sources(), loader, SourceCache::new(cache_ttl))
    }

    /// Engine over the embedded sources only.
    pub fn builtin() -> Self {
        Self::with_sources(builtin_sources(), SourceLoader::default(), SourceCache::default())
    }

    pub fn with_sources(builtin: SourceMap, loader: SourceLoader, cache: SourceCache) -> Self {
        Self {
            builtin,
            advisors: AdvisorRegistry::builtin(),
            loader,
            cache,
        }
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    fn find_source(&self, id: &str) -> Option<Source> {
        self.loader
            .overlays(&self.cache)
            .iter()
            .rev()
            .find_map(|sources| sources.get(id).cloned())
            .or_else(|| self.builtin.get(id).cloned())
    }

    /// Source id picked for `date`; stable for the whole day.
    pub fn random_source_id(&self, date: NaiveDate) -> Result<String, WisdomError> {
        let ids = self.list_source_ids();
        if ids.is_empty() {
            return Err(WisdomError::NoSources);
        }
        let day = u64::try_from(date.year()).unwrap_or_default() * 10_000
            + u64::from(date.month()) * 100
            + u64::from(date.day());
        let seed = day + u64::from(fnv1a32(b"random_source"));
        let len = u64::try_from(ids.len()).unwrap_or(1);
        let idx = usize::try_from(seed % len).unwrap_or_default();
        ids.into_iter().nth(idx).ok_or(WisdomError::NoSources)
    }
}

impl Default for WisdomEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WisdomProvider for WisdomEngine {
    fn lookup_quote(
        &self,
        score: f64,
        source_id: &str,
        today: NaiveDate,
    ) -> Result<Quote, WisdomError> {
        let id = if source_id == RANDOM_SOURCE {
            self.random_source_id(today)?
        } else {
            source_id.to_string()
        };
        let source = self
            .find_source(&id)
            .ok_or(WisdomError::UnknownSource { id })?;
        Ok(source.quote_for(AeonLevel::from_score(score)))
    }

    fn lookup_advisor(&self, kind: SelectorKind, key: &str) -> Result<AdvisorInfo, WisdomError> {
        self.advisors.lookup(kind, key)
    }

    fn list_source_ids(&self) -> Vec<String> {
        let mut ids: BTreeSet<String> = self.builtin.keys().cloned().collect();
        for sources in self.loader.overlays(&self.cache) {
            ids.extend(sources.keys().cloned());
        }
        ids.into_iter().collect()
    }

    fn source_summary(&self, id: &str) -> Option<SourceSummary> {
        self.find_source(id).map(|source| SourceSummary {
            id: id.to_string(),
            name: source.name,
            icon: source.icon,
            description: source.description,
            language: source.language,
        })
    }

    fn advisors(&self, kind: SelectorKind) -> BTreeMap<String, AdvisorInfo> {
        self.advisors.all(kind).clone()
    }
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(0x0100_0193)
    })
}
