//! アップロードワークフローのテスト
//!
//! 状態遷移はフェイクのAPIで、エンドツーエンドはモックサーバーで確認する。

mod common;

use async_trait::async_trait;
use common::{client_for, envelope, history_entry, history_json, pdf_bytes, summary, summary_json};
use httpmock::prelude::*;
use pdf_summary_client::error::ClientError;
use pdf_summary_client::gateway::{GatewayError, GatewayErrorKind, ProgressCallback, SummaryApi};
use pdf_summary_client::pdf_file::PdfFile;
use pdf_summary_client::workflow::{UploadPhase, WorkflowController, UPLOAD_INTERRUPTED_MESSAGE};
use pdf_summary_common::{DocumentSummary, HistoryResponse};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// 応答を差し替えられるフェイク
struct FakeApi {
    healthy: AtomicBool,
    progress: Mutex<Vec<u8>>,
    upload: Mutex<Result<DocumentSummary, GatewayError>>,
    history: Mutex<Result<HistoryResponse, GatewayError>>,
    /// 設定されていればアップロードを止めておく（entered, release）
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    /// trueの間は送信・履歴取得が応答しない
    stall_uploads: AtomicBool,
    stall_history: AtomicBool,
    upload_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            progress: Mutex::new(vec![25, 50, 75, 100]),
            upload: Mutex::new(Ok(summary("doc-1"))),
            history: Mutex::new(Ok(HistoryResponse::default())),
            gate: Mutex::new(None),
            stall_uploads: AtomicBool::new(false),
            stall_history: AtomicBool::new(false),
            upload_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn set_progress(&self, steps: Vec<u8>) {
        *self.progress.lock().unwrap() = steps;
    }

    fn set_upload(&self, result: Result<DocumentSummary, GatewayError>) {
        *self.upload.lock().unwrap() = result;
    }

    fn set_history(&self, result: Result<HistoryResponse, GatewayError>) {
        *self.history.lock().unwrap() = result;
    }

    fn hold_uploads(&self) -> (Arc<Notify>, Arc<Notify>) {
        let gate = (Arc::new(Notify::new()), Arc::new(Notify::new()));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl SummaryApi for FakeApi {
    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn upload_pdf(
        &self,
        _file: PdfFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<DocumentSummary, GatewayError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let steps = self.progress.lock().unwrap().clone();
        if let Some(callback) = &on_progress {
            for step in steps {
                callback(step);
                tokio::task::yield_now().await;
            }
        }
        if self.stall_uploads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let gate = self.gate.lock().unwrap().clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        self.upload.lock().unwrap().clone()
    }

    async fn get_history(&self) -> Result<HistoryResponse, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_history.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.history.lock().unwrap().clone()
    }

    async fn get_document_by_id(&self, id: &str) -> Result<DocumentSummary, GatewayError> {
        Ok(summary(id))
    }
}

fn controller() -> (Arc<FakeApi>, Arc<WorkflowController<FakeApi>>) {
    let api = Arc::new(FakeApi::new());
    let controller = Arc::new(WorkflowController::new(api.clone()));
    (api, controller)
}

fn pdf() -> PdfFile {
    PdfFile::new("report.pdf", pdf_bytes(4096))
}

fn application_error(message: &str) -> GatewayError {
    GatewayError::new(GatewayErrorKind::Application, message)
}

#[tokio::test]
async fn test_initial_state_is_idle() {
    let (_, controller) = controller();
    let state = controller.upload_state();

    assert_eq!(state.phase(), UploadPhase::Idle);
    assert_eq!(state.progress(), 0);
    assert!(state.error().is_none());
    assert!(state.result().is_none());
    assert_eq!(controller.backend_available(), None);
    assert!(controller.upload_enabled());
}

#[tokio::test]
async fn test_start_probes_health_and_loads_history() {
    let (api, controller) = controller();
    api.set_history(Ok(HistoryResponse {
        documents: vec![history_entry("a", "a.pdf", 10)],
    }));

    assert!(controller.start().await);
    assert_eq!(controller.backend_available(), Some(true));
    assert_eq!(controller.history_state().documents.len(), 1);
    assert!(!controller.history_state().is_loading);
}

#[tokio::test]
async fn test_upload_success_transitions() {
    let (api, controller) = controller();
    let mut updates = controller.subscribe_upload();

    let document = controller.upload(pdf()).await.unwrap();

    assert_eq!(document, summary("doc-1"));
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Succeeded);
    assert_eq!(state.progress(), 100);
    assert_eq!(state.result(), Some(&summary("doc-1")));
    assert!(state.error().is_none());
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().phase(), UploadPhase::Succeeded);

    // 成功後に履歴を再読み込み
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upload_rejected_transitions_to_failed() {
    let (api, controller) = controller();
    api.set_upload(Err(application_error("bad file")));

    let err = controller.upload(pdf()).await.unwrap_err();

    assert!(matches!(err, ClientError::Gateway(ref e) if e.message == "bad file"));
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Failed);
    assert_eq!(state.error(), Some("bad file"));
    assert_eq!(state.progress(), 0);
    assert!(state.result().is_none());

    // 失敗時は履歴を読み込まない
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
}

/// 購読側が受け取る進捗は1回の送信の中で減らない
#[tokio::test]
async fn test_published_progress_is_non_decreasing() {
    let (api, controller) = controller();
    api.set_progress(vec![10, 10, 5, 40, 30, 90]);

    let mut updates = controller.subscribe_upload();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            seen.push(state.progress());
            if !state.is_uploading() {
                break;
            }
        }
        seen
    });

    controller.upload(pdf()).await.unwrap();
    let seen = observer.await.unwrap();

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "進捗が減少した: {:?}", seen);
    assert!(seen.iter().any(|p| (1..100).contains(p)), "途中経過が届いていない: {:?}", seen);
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn test_progress_ignores_stale_reports() {
    let (api, controller) = controller();
    api.set_progress(vec![10, 10, 5, 40, 30]);
    let (entered, release) = api.hold_uploads();

    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.upload(pdf()).await })
    };

    entered.notified().await;
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Uploading);
    assert_eq!(state.progress(), 40);

    release.notify_one();
    task.await.unwrap().unwrap();
    assert_eq!(controller.upload_state().progress(), 100);
}

#[tokio::test]
async fn test_progress_resets_on_new_attempt() {
    let (api, controller) = controller();
    controller.upload(pdf()).await.unwrap();
    assert_eq!(controller.upload_state().progress(), 100);

    api.set_progress(Vec::new());
    let (entered, release) = api.hold_uploads();
    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.upload(pdf()).await })
    };

    entered.notified().await;
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Uploading);
    assert_eq!(state.progress(), 0);
    assert!(state.result().is_none());

    release.notify_one();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_upload_is_rejected() {
    let (api, controller) = controller();
    let (entered, release) = api.hold_uploads();

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.upload(pdf()).await })
    };
    entered.notified().await;
    let before = controller.upload_state();

    let second = controller.upload(pdf()).await;
    assert!(matches!(second, Err(ClientError::UploadInProgress)));
    assert_eq!(controller.upload_state(), before);
    assert_eq!(api.upload_calls.load(Ordering::SeqCst), 1);

    release.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(controller.upload_state().phase(), UploadPhase::Succeeded);
}

/// タイムアウト等で破棄された送信は失敗扱いになり、次の送信を妨げない
#[tokio::test]
async fn test_dropped_upload_does_not_block_controller() {
    let (api, controller) = controller();
    api.stall_uploads.store(true, Ordering::SeqCst);

    let result = tokio::time::timeout(Duration::from_millis(50), controller.upload(pdf())).await;
    assert!(result.is_err());

    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Failed);
    assert_eq!(state.error(), Some(UPLOAD_INTERRUPTED_MESSAGE));
    assert_eq!(state.progress(), 0);

    assert!(controller.reset());
    assert_eq!(controller.upload_state().phase(), UploadPhase::Idle);

    api.stall_uploads.store(false, Ordering::SeqCst);
    controller.upload(pdf()).await.unwrap();
    assert_eq!(controller.upload_state().phase(), UploadPhase::Succeeded);
}

/// 破棄された履歴読み込みは読み込み中のまま残らない
#[tokio::test]
async fn test_dropped_history_refresh_clears_loading() {
    let (api, controller) = controller();
    api.stall_history.store(true, Ordering::SeqCst);

    let result = tokio::time::timeout(Duration::from_millis(50), controller.refresh_history()).await;
    assert!(result.is_err());
    assert!(!controller.history_state().is_loading);

    api.stall_history.store(false, Ordering::SeqCst);
    assert_eq!(controller.refresh_history().await.unwrap(), 0);
}

/// 成功後の履歴読み込み中に破棄されても成功状態は保たれる
#[tokio::test]
async fn test_drop_during_history_reload_keeps_success() {
    let (api, controller) = controller();
    api.stall_history.store(true, Ordering::SeqCst);

    let result = tokio::time::timeout(Duration::from_millis(50), controller.upload(pdf())).await;
    assert!(result.is_err());

    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Succeeded);
    assert_eq!(state.result(), Some(&summary("doc-1")));
    assert!(!controller.history_state().is_loading);
}

#[tokio::test]
async fn test_history_failure_keeps_succeeded_phase() {
    let (api, controller) = controller();
    api.set_history(Err(application_error("Failed to retrieve history")));

    controller.upload(pdf()).await.unwrap();

    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Succeeded);
    assert!(state.error().is_none());

    let history = controller.history_state();
    assert_eq!(history.last_error.as_deref(), Some("Failed to retrieve history"));
    assert!(!history.is_loading);
}

#[tokio::test]
async fn test_history_failure_keeps_previous_documents() {
    let (api, controller) = controller();
    api.set_history(Ok(HistoryResponse {
        documents: vec![history_entry("a", "a.pdf", 10), history_entry("b", "b.pdf", 20)],
    }));
    assert_eq!(controller.refresh_history().await.unwrap(), 2);

    api.set_history(Err(application_error("db down")));
    assert!(controller.refresh_history().await.is_err());

    let history = controller.history_state();
    assert_eq!(history.documents.len(), 2);
    assert_eq!(history.last_error.as_deref(), Some("db down"));

    // 次の成功で診断メッセージは消える
    api.set_history(Ok(HistoryResponse::default()));
    controller.refresh_history().await.unwrap();
    assert!(controller.history_state().last_error.is_none());
}

#[tokio::test]
async fn test_unreachable_backend_refuses_upload_until_retry() {
    let (api, controller) = controller();
    api.set_healthy(false);

    assert!(!controller.start().await);
    assert_eq!(controller.backend_available(), Some(false));
    assert!(!controller.upload_enabled());

    let err = controller.upload(pdf()).await.unwrap_err();
    assert!(matches!(err, ClientError::BackendUnavailable));
    assert_eq!(controller.upload_state().phase(), UploadPhase::Idle);
    assert_eq!(api.upload_calls.load(Ordering::SeqCst), 0);

    // バックエンド復旧後の再試行
    api.set_healthy(true);
    assert!(controller.check_backend_health().await);
    assert_eq!(controller.backend_available(), Some(true));
    controller.upload(pdf()).await.unwrap();
}

#[tokio::test]
async fn test_invalid_file_fails_without_network() {
    let (api, controller) = controller();

    let err = controller
        .upload(PdfFile::new("notes.txt", pdf_bytes(128)))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidFile(_)));
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Failed);
    assert!(state.error().unwrap().contains("notes.txt"));
    assert_eq!(api.upload_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reset_only_from_terminal_phases() {
    let (api, controller) = controller();
    assert!(!controller.reset());

    controller.upload(pdf()).await.unwrap();
    assert!(controller.reset());
    assert_eq!(controller.upload_state().phase(), UploadPhase::Idle);
    assert_eq!(controller.upload_state().progress(), 0);

    api.set_upload(Err(application_error("bad file")));
    let _ = controller.upload(pdf()).await;
    assert!(controller.reset());
    assert!(controller.upload_state().error().is_none());

    let (entered, release) = api.hold_uploads();
    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.upload(pdf()).await })
    };
    entered.notified().await;
    assert!(!controller.reset());
    assert_eq!(controller.upload_state().phase(), UploadPhase::Uploading);

    release.notify_one();
    let _ = task.await.unwrap();
}

#[tokio::test]
async fn test_open_document() {
    let (_, controller) = controller();
    let document = controller.open_document("abc").await.unwrap();
    assert_eq!(document.id, "abc");
}

/// モックサーバーを使った一連の流れ
#[tokio::test]
async fn test_end_to_end_with_mock_backend() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path("/health");
            then.status(200).json_body(json!({"status": "healthy"}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/api/documents/upload");
            then.status(200).json_body(envelope(summary_json("doc-9")));
        })
        .await;
    let history = server
        .mock_async(|when, then| {
            when.method(Method::GET).path("/api/documents/history");
            then.status(200)
                .json_body(history_json(&[history_entry("doc-9", "report.pdf", 1536)]));
        })
        .await;

    let controller = WorkflowController::new(Arc::new(client_for(&server.base_url())));
    assert!(controller.start().await);

    let document = controller
        .upload(PdfFile::new("report.pdf", pdf_bytes(200 * 1024)))
        .await
        .unwrap();

    assert_eq!(document, summary("doc-9"));
    let state = controller.upload_state();
    assert_eq!(state.phase(), UploadPhase::Succeeded);
    assert_eq!(state.progress(), 100);
    assert_eq!(controller.history_state().documents[0].id, "doc-9");

    upload.assert_async().await;
    // 起動時と成功後の2回
    history.assert_hits_async(2).await;
}

/// 到達不可から復旧するケース
#[tokio::test]
async fn test_end_to_end_health_recovery() {
    let server = MockServer::start_async().await;
    let mut down = server
        .mock_async(|when, then| {
            when.method(Method::GET).path("/health");
            then.status(503);
        })
        .await;

    let controller = WorkflowController::new(Arc::new(client_for(&server.base_url())));
    assert!(!controller.check_backend_health().await);
    assert!(!controller.upload_enabled());

    down.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path("/health");
            then.status(200);
        })
        .await;

    assert!(controller.check_backend_health().await);
    assert!(controller.upload_enabled());
}
