use std::path::PathBuf;
use std::time::Duration;

use devwisdom_log::DEFAULT_LOG_DIR;

pub const DEFAULT_SOURCE: &str = "pistis_sophia";
pub const DEFAULT_BRIEFING_SOURCES: [&str; 3] = ["pistis_sophia", "stoic", "tao"];
pub const MAX_BRIEFING_SOURCES: usize = 3;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Runtime settings, read from `DEVWISDOM_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub log_dir: PathBuf,
    pub consultation_log: bool,
    pub default_source: String,
    pub briefing_sources: Vec<String>,
    pub source_paths: Vec<PathBuf>,
    pub sources_cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            consultation_log: true,
            default_source: DEFAULT_SOURCE.to_string(),
            briefing_sources: DEFAULT_BRIEFING_SOURCES.map(str::to_string).to_vec(),
            source_paths: Vec::new(),
            sources_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let log_dir = non_empty("DEVWISDOM_LOG_DIR").map_or(defaults.log_dir, PathBuf::from);
        let consultation_log = non_empty("DEVWISDOM_CONSULTATION_LOG").map_or(true, |v| {
            !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0" | "no")
        });
        let default_source = non_empty("DEVWISDOM_DEFAULT_SOURCE")
            .map_or(defaults.default_source, |v| v.trim().to_string());
        let briefing_sources = non_empty("DEVWISDOM_BRIEFING_SOURCES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .take(MAX_BRIEFING_SOURCES)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.briefing_sources);
        let source_paths = non_empty("DEVWISDOM_SOURCES")
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default();
        let ttl = env_u64(
            var("DEVWISDOM_SOURCES_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
            1,
            86_400,
        );

        Self {
            log_dir,
            consultation_log,
            default_source,
            briefing_sources,
            source_paths,
            sources_cache_ttl: Duration::from_secs(ttl),
        }
    }
}

fn env_u64(raw: Option<String>, default: u64, min: u64, max: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
