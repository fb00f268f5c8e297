use std::io;

use devwisdom_mcp::{ServerConfig, WisdomServer};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    // stdout carries the protocol; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("DEVWISDOM_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        log_dir = %config.log_dir.display(),
        consultation_log = config.consultation_log,
        "devwisdomd starting on stdio"
    );
    WisdomServer::new(&config).serve_stdio()
}
