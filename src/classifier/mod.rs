//! Maps failure payloads to stable, display-ready messages.

pub mod classifier;
pub mod code_table;

pub use classifier::{flatten_detail, ErrorClassifier};
pub use code_table::{code_for_status, ErrorCodeTable, DEFAULT_FALLBACK_MESSAGE};
