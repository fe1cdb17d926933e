pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod list;
pub mod matcher;
pub mod output;
pub mod walker;

pub use classify::{classify, classify_bytes, ClassifiedContent};
pub use config::{FileConfig, SearchConfig};
pub use context::{ContextLine, MatchRecord};
pub use encoding::Encoding;
pub use error::{Result, RzgrepError};
pub use matcher::{CompiledPattern, MatchSpan};
pub use walker::{walk, TraversalResult, Walk};
