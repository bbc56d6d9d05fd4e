pub mod engine;
pub mod source;

pub use engine::{ScanEngine, ScanSummary};
pub use source::{EventSource, JsonFileSource};
