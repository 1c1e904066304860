//! PDF Summary Common Library
//!
//! クライアント本体とテストで共有される型とユーティリティ

pub mod types;
pub mod envelope;
pub mod error;
pub mod format;

pub use types::{DocumentHistoryEntry, DocumentSummary, HistoryResponse};
pub use envelope::{ApiEnvelope, EnvelopeFailure, ErrorBody, parse_envelope, parse_error_body};
pub use error::{Error, Result};
pub use format::{format_date, format_file_size};
