//! ドキュメントの型定義
//!
//! バックエンドとやり取りするデータ:
//! - DocumentSummary: アップロード結果・単一ドキュメント取得の結果
//! - DocumentHistoryEntry: 履歴一覧の1件
//! - HistoryResponse: 履歴エンドポイントのペイロード

use serde::{Deserialize, Serialize};

/// 要約済みドキュメント
///
/// `upload_date` はバックエンドの値をそのまま保持する（表示時のみ整形）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub summary: String,
    pub file_size: u64,
    pub page_count: u32,
    pub upload_date: String,

    /// 抽出メタデータ（中身は解釈しない）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// 履歴エントリ（メタデータなし）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHistoryEntry {
    pub id: String,
    pub filename: String,
    pub summary: String,
    pub upload_date: String,
    pub file_size: u64,
    pub page_count: u32,
}

/// 履歴レスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub documents: Vec<DocumentHistoryEntry>,
}
