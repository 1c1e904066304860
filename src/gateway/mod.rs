mod client;
mod error;
mod observer;
mod progress;

pub use client::ApiClient;
pub use error::{select_message, GatewayError, GatewayErrorKind, Operation};
pub use observer::{ApiEvent, RecordingObserver, RequestObserver, TracingObserver};
pub use progress::{chunked_body, percent_of, ProgressCallback, ProgressTracker, UPLOAD_CHUNK_SIZE};

use crate::pdf_file::PdfFile;
use async_trait::async_trait;
use pdf_summary_common::{DocumentSummary, HistoryResponse};

/// バックエンドとの唯一の接点
///
/// ワークフローはこのトレイト越しにしか通信しないため、
/// テストでは任意の実装に差し替えられる。
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// 到達確認。失敗はすべて `false` になる
    async fn health_check(&self) -> bool;

    async fn upload_pdf(
        &self,
        file: PdfFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<DocumentSummary, GatewayError>;

    async fn get_history(&self) -> Result<HistoryResponse, GatewayError>;

    async fn get_document_by_id(&self, id: &str) -> Result<DocumentSummary, GatewayError>;
}
