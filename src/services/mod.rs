pub mod cache_gate;
pub mod discovery;
pub mod exporter;
pub mod storage;

pub use cache_gate::CacheGate;
pub use discovery::SubpageDiscoverer;
pub use exporter::PageExporter;
pub use storage::{S3Storage, Uploader};
