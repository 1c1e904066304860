//! レスポンスエンベロープのパーサー
//!
//! ヘルスチェック以外の全エンドポイントは
//! `{ success, message, data? }` の形でラップされて返る。
//! エラー時のボディは `detail` を持つことがあり、`message` より優先する。

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 共通レスポンスエンベロープ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// エンベロープが契約を満たさなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeFailure {
    /// `success=false`
    Rejected { message: String },
    /// `success=true` だが `data` がない
    MissingData,
}

impl<T> ApiEnvelope<T> {
    /// `success=true` かつ `data` ありの場合のみペイロードを返す
    pub fn into_data(self) -> std::result::Result<T, EnvelopeFailure> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(EnvelopeFailure::MissingData),
            (false, _) => Err(EnvelopeFailure::Rejected { message: self.message }),
        }
    }
}

/// エラーボディから取り出したメッセージ候補
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: Option<String>,
    pub message: Option<String>,
}

/// レスポンスボディをエンベロープとしてパース
pub fn parse_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<ApiEnvelope<T>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::InvalidEnvelope("empty body".into()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// エラーボディを緩くパース
///
/// JSONでない・オブジェクトでない場合は空の `ErrorBody` を返す。
/// `detail` が検証エラー配列（`[{ "msg": ... }]`）の場合は `msg` を連結する。
pub fn parse_error_body(body: &[u8]) -> ErrorBody {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return ErrorBody::default(),
    };

    let detail = match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    };

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    ErrorBody { detail, message }
}
