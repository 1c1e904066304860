//! ワークフローの状態
//!
//! `UploadState` はフェーズごとのコンストラクタでしか作れないため、
//! 「succeeded ⇔ result あり」「failed ⇔ error あり」が常に成り立つ。

use pdf_summary_common::{DocumentHistoryEntry, DocumentSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadState {
    phase: UploadPhase,
    progress: u8,
    error: Option<String>,
    result: Option<DocumentSummary>,
}

impl Default for UploadState {
    fn default() -> Self {
        Self::idle()
    }
}

impl UploadState {
    pub fn idle() -> Self {
        Self {
            phase: UploadPhase::Idle,
            progress: 0,
            error: None,
            result: None,
        }
    }

    /// 新しい試行の開始（進捗は0から）
    pub fn uploading() -> Self {
        Self {
            phase: UploadPhase::Uploading,
            ..Self::idle()
        }
    }

    pub fn succeeded(result: DocumentSummary) -> Self {
        Self {
            phase: UploadPhase::Succeeded,
            progress: 100,
            error: None,
            result: Some(result),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            phase: UploadPhase::Failed,
            progress: 0,
            error: Some(error.into()),
            result: None,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&DocumentSummary> {
        self.result.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.phase == UploadPhase::Uploading
    }

    /// 送信中のみ進捗を進める。変化した場合に `true`
    ///
    /// 同じ値・小さい値の再通知は無視される。
    pub fn advance_progress(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.phase != UploadPhase::Uploading || percent <= self.progress {
            return false;
        }
        self.progress = percent;
        true
    }
}

/// 履歴の読み込み状態（アップロード状態とは独立）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub documents: Vec<DocumentHistoryEntry>,
    pub is_loading: bool,
    /// 直近の読み込み失敗（診断用。アップロードのエラーには出さない）
    pub last_error: Option<String>,
}
