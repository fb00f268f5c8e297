use std::path::PathBuf;

use thiserror::Error;

use crate::advisors::SelectorKind;

#[derive(Debug, Error)]
pub enum WisdomError {
    #[error("unknown source {id:?}; read wisdom://sources to list available sources")]
    UnknownSource { id: String },

    #[error("no advisor for {kind} {key:?}; read wisdom://advisors to list available advisors")]
    NoAdvisor { kind: SelectorKind, key: String },

    #[error("no wisdom sources are loaded")]
    NoSources,

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sources file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid source {id:?}: {reason}")]
    InvalidSource { id: String, reason: String },
}
