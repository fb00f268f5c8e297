pub mod args;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use error::ToolError;
pub use handlers::WisdomHandlers;
pub use server::WisdomServer;
