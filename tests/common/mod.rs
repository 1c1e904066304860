#![allow(dead_code)]

use pdf_summary_client::config::GatewayConfig;
use pdf_summary_client::gateway::ApiClient;
use pdf_summary_common::{DocumentHistoryEntry, DocumentSummary};
use serde_json::{json, Value};

pub fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        base_url: base_url.to_string(),
        upload_timeout_ms: 5_000,
        metadata_timeout_ms: 2_000,
    }
}

pub fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(gateway_config(base_url)).expect("Failed to build client")
}

pub fn summary_json(id: &str) -> Value {
    json!({
        "id": id,
        "filename": "report.pdf",
        "summary": "This document describes the quarterly results.",
        "file_size": 1536,
        "page_count": 3,
        "upload_date": "2024-01-15T10:30:00.123456",
        "metadata": {"title": "Quarterly report", "author": "Finance"}
    })
}

pub fn summary(id: &str) -> DocumentSummary {
    serde_json::from_value(summary_json(id)).expect("invalid summary fixture")
}

pub fn history_entry(id: &str, filename: &str, file_size: u64) -> DocumentHistoryEntry {
    DocumentHistoryEntry {
        id: id.to_string(),
        filename: filename.to_string(),
        summary: format!("Summary of {}", filename),
        upload_date: "2024-01-15T10:30:00".to_string(),
        file_size,
        page_count: 2,
    }
}

pub fn envelope(data: Value) -> Value {
    json!({"success": true, "message": "OK", "data": data})
}

pub fn history_json(entries: &[DocumentHistoryEntry]) -> Value {
    envelope(json!({ "documents": entries }))
}

/// `%PDF` で始まるダミーデータ
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(len.max(data.len()), b'x');
    data
}
