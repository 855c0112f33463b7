pub mod export_ctx;
pub mod export_flow;

pub use export_ctx::ExportCtx;
pub use export_flow::{ExportFlow, ExportOutcome, FormatOutcome, JobResult};
