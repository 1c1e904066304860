//! ゲートウェイのエラー契約
//!
//! 通信失敗・非2xx・`success=false`・エンベロープ不正の4種類を
//! メッセージ1つを持つ `GatewayError` に畳み込む。
//! メッセージの優先順位は `detail` > `message` > 通信エラー文言 > 汎用メッセージ。

use thiserror::Error;

/// 失敗の分類（呼び出し側は通常メッセージしか見ない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// 接続不可・タイムアウト・ボディ読み込み失敗
    Transport,
    /// 2xx以外のステータス
    HttpStatus(u16),
    /// エンベロープが `success=false`
    Application,
    /// エンベロープとして解釈できない、または `data` がない
    MalformedResponse,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind == GatewayErrorKind::Transport
    }
}

/// 呼び出し種別ごとの既定メッセージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    History,
    Document,
}

impl Operation {
    /// エンベロープが失敗・不正で、メッセージも無い場合の文言
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Upload => "File upload error",
            Operation::History => "Failed to retrieve history",
            Operation::Document => "Failed to retrieve document",
        }
    }

    /// どの候補も得られなかった場合の最終フォールバック
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Upload => "Unknown error during file upload",
            Operation::History => "Unknown error while retrieving history",
            Operation::Document => "Unknown error while retrieving document",
        }
    }
}

/// 優先順位に従ってメッセージを選ぶ。空文字列は候補として扱わない。
pub fn select_message(
    detail: Option<&str>,
    message: Option<&str>,
    transport: Option<&str>,
    fallback: &str,
) -> String {
    [detail, message, transport]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
