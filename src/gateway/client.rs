//! バックエンドAPIクライアント
//!
//! reqwestで4つのエンドポイントを呼び出し、結果をエンベロープから取り出す。
//! 失敗はすべて `GatewayError` に正規化される。

use super::error::{select_message, GatewayError, GatewayErrorKind, Operation};
use super::observer::RequestObserver;
use super::progress::{chunked_body, ProgressCallback, ProgressTracker};
use super::SummaryApi;
use crate::config::GatewayConfig;
use crate::error::{ClientError, Result};
use crate::pdf_file::{PdfFile, PDF_MIME_TYPE};
use async_trait::async_trait;
use pdf_summary_common::{
    parse_envelope, parse_error_body, ApiEnvelope, DocumentSummary, EnvelopeFailure,
    HistoryResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

pub struct ApiClient {
    client: Client,
    base_url: Url,
    config: GatewayConfig,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl ApiClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("APIのURLが不正です ({}): {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "APIのURLが不正です: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            config,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// ベースURLにパスセグメントを追加（各セグメントはエスケープされる）
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn observe(&self, f: impl FnOnce(&dyn RequestObserver)) {
        if let Some(observer) = &self.observer {
            f(observer.as_ref());
        }
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        operation: Operation,
        method: &str,
        url: &Url,
        request: RequestBuilder,
        timeout: Duration,
    ) -> std::result::Result<T, GatewayError> {
        let path = url.path().to_string();
        self.observe(|o| o.on_request(method, &path));

        let result = self.execute(operation, &path, request, timeout).await;
        if let Err(e) = &result {
            self.observe(|o| o.on_error(&path, &e.message));
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> std::result::Result<T, GatewayError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(operation, &e, timeout))?;

        let status = response.status();
        self.observe(|o| o.on_response(status.as_u16(), path));

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(operation, &e, timeout))?;

        decode_envelope(operation, status, &body)
    }
}

#[async_trait]
impl SummaryApi for ApiClient {
    async fn health_check(&self) -> bool {
        let url = self.endpoint(&["health"]);
        let path = url.path().to_string();
        self.observe(|o| o.on_request("GET", &path));

        match self
            .client
            .get(url)
            .timeout(self.config.metadata_timeout())
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                self.observe(|o| o.on_response(status.as_u16(), &path));
                status.is_success()
            }
            Err(e) => {
                self.observe(|o| o.on_error(&path, &e.to_string()));
                false
            }
        }
    }

    async fn upload_pdf(
        &self,
        file: PdfFile,
        on_progress: Option<ProgressCallback>,
    ) -> std::result::Result<DocumentSummary, GatewayError> {
        let operation = Operation::Upload;
        let url = self.endpoint(&["api", "documents", "upload"]);
        let timeout = self.config.upload_timeout();

        let total = file.size();
        let tracker = on_progress.map(|callback| Arc::new(ProgressTracker::new(total, callback)));
        let body = Body::wrap_stream(chunked_body(file.data, tracker));

        let part = Part::stream_with_length(body, total)
            .file_name(file.file_name)
            .mime_str(PDF_MIME_TYPE)
            .map_err(|e| transport_error(operation, &e, timeout))?;
        let form = Form::new().part("file", part);

        let request = self.client.post(url.clone()).multipart(form);
        self.send_envelope(operation, "POST", &url, request, timeout)
            .await
    }

    async fn get_history(&self) -> std::result::Result<HistoryResponse, GatewayError> {
        let url = self.endpoint(&["api", "documents", "history"]);
        let request = self.client.get(url.clone());
        self.send_envelope(
            Operation::History,
            "GET",
            &url,
            request,
            self.config.metadata_timeout(),
        )
        .await
    }

    async fn get_document_by_id(
        &self,
        id: &str,
    ) -> std::result::Result<DocumentSummary, GatewayError> {
        let url = self.endpoint(&["api", "documents", id]);
        let request = self.client.get(url.clone());
        self.send_envelope(
            Operation::Document,
            "GET",
            &url,
            request,
            self.config.metadata_timeout(),
        )
        .await
    }
}

/// 通信レベルの失敗をメッセージ付きエラーに変換
fn transport_error(operation: Operation, error: &reqwest::Error, timeout: Duration) -> GatewayError {
    let message = if error.is_timeout() {
        format!("timeout of {}ms exceeded", timeout.as_millis())
    } else {
        match error.source() {
            Some(source) => format!("{}: {}", error, source),
            None => error.to_string(),
        }
    };

    GatewayError::new(
        GatewayErrorKind::Transport,
        select_message(None, None, Some(&message), operation.fallback_message()),
    )
}

/// ステータスとボディからペイロードを取り出す
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    operation: Operation,
    status: StatusCode,
    body: &[u8],
) -> std::result::Result<T, GatewayError> {
    if !status.is_success() {
        let parsed = parse_error_body(body);
        let status_message = format!("Request failed with status code {}", status.as_u16());
        return Err(GatewayError::new(
            GatewayErrorKind::HttpStatus(status.as_u16()),
            select_message(
                parsed.detail.as_deref(),
                parsed.message.as_deref(),
                Some(&status_message),
                operation.fallback_message(),
            ),
        ));
    }

    let envelope: ApiEnvelope<T> = parse_envelope(body).map_err(|e| {
        tracing::debug!(error = %e, "response is not a valid envelope");
        GatewayError::new(GatewayErrorKind::MalformedResponse, operation.failure_message())
    })?;

    match envelope.into_data() {
        Ok(data) => Ok(data),
        Err(EnvelopeFailure::MissingData) => Err(GatewayError::new(
            GatewayErrorKind::MalformedResponse,
            operation.failure_message(),
        )),
        Err(EnvelopeFailure::Rejected { message }) => {
            let detail = parse_error_body(body).detail;
            Err(GatewayError::new(
                GatewayErrorKind::Application,
                select_message(
                    detail.as_deref(),
                    Some(&message),
                    None,
                    operation.failure_message(),
                ),
            ))
        }
    }
}
