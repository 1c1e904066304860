//! アップロードワークフローの制御
//!
//! 起動時のヘルスチェック → ファイル送信 → 成功時の履歴再読み込み、を順に実行する。
//! 状態は watch チャネルで公開し、画面側は購読して描画する。

use super::state::{HistoryState, UploadPhase, UploadState};
use crate::error::{ClientError, Result};
use crate::gateway::{GatewayError, ProgressCallback, SummaryApi};
use crate::pdf_file::PdfFile;
use pdf_summary_common::DocumentSummary;
use std::sync::Arc;
use tokio::sync::watch;

/// 完了前に破棄された送信（タイムアウト・select! など）で表示される理由
pub const UPLOAD_INTERRUPTED_MESSAGE: &str = "Upload was interrupted before it completed";

pub struct WorkflowController<A: SummaryApi + ?Sized> {
    api: Arc<A>,
    upload: Arc<watch::Sender<UploadState>>,
    history: watch::Sender<HistoryState>,
    backend_available: watch::Sender<Option<bool>>,
}

impl<A: SummaryApi + ?Sized> WorkflowController<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (upload, _) = watch::channel(UploadState::idle());
        let (history, _) = watch::channel(HistoryState::default());
        let (backend_available, _) = watch::channel(None);

        Self {
            api,
            upload: Arc::new(upload),
            history,
            backend_available,
        }
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload.borrow().clone()
    }

    pub fn subscribe_upload(&self) -> watch::Receiver<UploadState> {
        self.upload.subscribe()
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.borrow().clone()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<HistoryState> {
        self.history.subscribe()
    }

    /// 直近のヘルスチェック結果（未確認なら `None`）
    pub fn backend_available(&self) -> Option<bool> {
        *self.backend_available.borrow()
    }

    /// 到達不可が確定している間はアップロードUIを出さない
    pub fn upload_enabled(&self) -> bool {
        self.backend_available() != Some(false)
    }

    /// 起動処理: ヘルスチェックと履歴読み込みを並行実行
    pub async fn start(&self) -> bool {
        let (available, _) = tokio::join!(self.check_backend_health(), self.refresh_history());
        available
    }

    /// ヘルスチェック（「再試行」もこれを呼ぶ）
    pub async fn check_backend_health(&self) -> bool {
        let available = self.api.health_check().await;
        self.backend_available.send_replace(Some(available));
        if !available {
            tracing::warn!("Backend health check failed");
        }
        available
    }

    /// 履歴の再読み込み
    ///
    /// 失敗しても直前の一覧は残し、アップロード状態には一切触れない。
    pub async fn refresh_history(&self) -> std::result::Result<usize, GatewayError> {
        self.history.send_modify(|h| h.is_loading = true);
        let mut loading = LoadingGuard::new(&self.history);

        match self.api.get_history().await {
            Ok(response) => {
                let count = response.documents.len();
                loading.finish(|h| {
                    *h = HistoryState {
                        documents: response.documents,
                        is_loading: false,
                        last_error: None,
                    };
                });
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load history");
                loading.finish(|h| {
                    h.is_loading = false;
                    h.last_error = Some(e.message.clone());
                });
                Err(e)
            }
        }
    }

    /// ファイルを送信して要約を取得
    ///
    /// 送信中の2回目の呼び出しは `UploadInProgress` で拒否する。
    pub async fn upload(&self, file: PdfFile) -> Result<DocumentSummary> {
        if !self.upload_enabled() {
            return Err(ClientError::BackendUnavailable);
        }

        let started = self.upload.send_if_modified(|state| {
            if state.is_uploading() {
                return false;
            }
            *state = UploadState::uploading();
            true
        });
        if !started {
            return Err(ClientError::UploadInProgress);
        }
        let mut attempt = AttemptGuard::new(&self.upload);

        tracing::info!(file = %file.file_name, size = file.size(), "Upload started");

        if let Err(reason) = file.validate() {
            attempt.finish(UploadState::failed(reason.clone()));
            return Err(ClientError::InvalidFile(reason));
        }

        let sender = Arc::clone(&self.upload);
        let on_progress: ProgressCallback = Arc::new(move |percent| {
            sender.send_if_modified(|state| state.advance_progress(percent));
        });

        match self.api.upload_pdf(file, Some(on_progress)).await {
            Ok(document) => {
                attempt.finish(UploadState::succeeded(document.clone()));
                tracing::info!(id = %document.id, "Upload succeeded");

                // 履歴の失敗は refresh_history 内で記録済み。フェーズは変えない
                if self.refresh_history().await.is_err() {
                    tracing::debug!("History reload after upload failed");
                }
                Ok(document)
            }
            Err(e) => {
                attempt.finish(UploadState::failed(e.message.clone()));
                Err(e.into())
            }
        }
    }

    /// 完了・失敗状態から待機状態へ戻す。戻した場合に `true`
    pub fn reset(&self) -> bool {
        self.upload.send_if_modified(|state| match state.phase() {
            UploadPhase::Succeeded | UploadPhase::Failed => {
                *state = UploadState::idle();
                true
            }
            UploadPhase::Idle | UploadPhase::Uploading => false,
        })
    }

    /// 履歴から選んだドキュメントの詳細を取得
    pub async fn open_document(&self, id: &str) -> std::result::Result<DocumentSummary, GatewayError> {
        self.api.get_document_by_id(id).await.map_err(|e| {
            tracing::error!(id, error = %e, "Failed to load document");
            e
        })
    }
}

/// 送信中状態の後始末
///
/// `finish` されないまま破棄されたら failed に落とし、次の送信と reset を可能にする。
struct AttemptGuard<'a> {
    state: &'a watch::Sender<UploadState>,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(state: &'a watch::Sender<UploadState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(&mut self, next: UploadState) {
        self.armed = false;
        self.state.send_replace(next);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Upload dropped before completion");
            self.state.send_if_modified(|state| {
                if !state.is_uploading() {
                    return false;
                }
                *state = UploadState::failed(UPLOAD_INTERRUPTED_MESSAGE);
                true
            });
        }
    }
}

/// 履歴読み込み中フラグの後始末（破棄時に `is_loading` を戻す）
struct LoadingGuard<'a> {
    history: &'a watch::Sender<HistoryState>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(history: &'a watch::Sender<HistoryState>) -> Self {
        Self { history, armed: true }
    }

    fn finish(&mut self, update: impl FnOnce(&mut HistoryState)) {
        self.armed = false;
        self.history.send_modify(update);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.history.send_if_modified(|h| std::mem::replace(&mut h.is_loading, false));
        }
    }
}
