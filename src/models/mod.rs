pub mod format;
pub mod job;

pub use format::OutputFormat;
pub use job::{Artifact, CacheDecision, PageJob};
