//! リクエスト/レスポンスの観測フック
//!
//! 診断用のトレース出力をクライアントに注入する。
//! 観測結果が制御フローに影響することはない。

use std::sync::Mutex;

pub trait RequestObserver: Send + Sync {
    fn on_request(&self, _method: &str, _path: &str) {}

    fn on_response(&self, _status: u16, _path: &str) {}

    fn on_error(&self, _path: &str, _message: &str) {}
}

/// `tracing` にリクエストの流れを出力する
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, method: &str, path: &str) {
        tracing::debug!(method, path, "API request");
    }

    fn on_response(&self, status: u16, path: &str) {
        tracing::debug!(status, path, "API response");
    }

    fn on_error(&self, path: &str, message: &str) {
        tracing::warn!(path, error = message, "API response error");
    }
}

/// 観測したイベント（テスト・デバッグ用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEvent {
    Request { method: String, path: String },
    Response { status: u16, path: String },
    Error { path: String, message: String },
}

/// イベントをメモリに溜める
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ApiEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ApiEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ApiEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, method: &str, path: &str) {
        self.push(ApiEvent::Request {
            method: method.to_string(),
            path: path.to_string(),
        });
    }

    fn on_response(&self, status: u16, path: &str) {
        self.push(ApiEvent::Response {
            status,
            path: path.to_string(),
        });
    }

    fn on_error(&self, path: &str, message: &str) {
        self.push(ApiEvent::Error {
            path: path.to_string(),
            message: message.to_string(),
        });
    }
}
