pub mod advisors;
pub mod cache;
pub mod engine;
pub mod error;
pub mod levels;
pub mod loader;
pub mod provider;
pub mod sources;

pub use advisors::*;
pub use cache::SourceCache;
pub use engine::WisdomEngine;
pub use error::WisdomError;
pub use levels::*;
pub use loader::SourceLoader;
pub use provider::*;
pub use sources::*;
