//! 対話モード
//!
//! 到達不可の間は再試行だけを提示し、接続後は
//! アップロード・履歴からの閲覧・履歴更新をメニューで繰り返す。

use crate::display::{history_rows, render_history, render_summary, status_line};
use crate::error::{ClientError, Result};
use crate::gateway::SummaryApi;
use crate::pdf_file::PdfFile;
use crate::workflow::{UploadPhase, UploadState, WorkflowController};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_summary_common::DocumentSummary;
use std::path::PathBuf;
use std::time::Duration;

/// メニュー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// PDFをアップロード
    Upload,
    /// 結果を閉じて次のファイルをアップロード
    UploadAnother,
    /// 履歴からドキュメントを開く
    OpenDocument,
    /// 履歴を再読み込み
    RefreshHistory,
    /// 終了
    Quit,
}

impl SessionAction {
    pub fn label(&self) -> &'static str {
        match self {
            SessionAction::Upload => "Upload a PDF",
            SessionAction::UploadAnother => "Upload another file",
            SessionAction::OpenDocument => "Open a document from history",
            SessionAction::RefreshHistory => "Refresh history",
            SessionAction::Quit => "Quit",
        }
    }

    /// 現在の状態で選べる操作
    pub fn menu(state: &UploadState, has_history: bool) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        match state.phase() {
            UploadPhase::Succeeded => actions.push(SessionAction::UploadAnother),
            UploadPhase::Idle | UploadPhase::Failed => actions.push(SessionAction::Upload),
            UploadPhase::Uploading => {}
        }
        if has_history {
            actions.push(SessionAction::OpenDocument);
        }
        actions.push(SessionAction::RefreshHistory);
        actions.push(SessionAction::Quit);
        actions
    }
}

/// 入力されたパスの前後の空白・引用符を除去（ドラッグ&ドロップ対策）
pub fn normalize_input_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// 進捗バーを表示しながらアップロード
///
/// バーはコントローラの状態チャネルを購読して更新する。
pub async fn upload_with_progress<A: SummaryApi + ?Sized>(
    controller: &WorkflowController<A>,
    file: PdfFile,
) -> Result<DocumentSummary> {
    let bar = ProgressBar::new(100);
    bar.set_style(progress_style());
    bar.set_message(file.file_name.clone());
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut updates = controller.subscribe_upload();
    let follow_progress = async {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            bar.set_position(state.progress() as u64);
            if state.is_uploading() && state.progress() == 100 {
                bar.set_message("要約を生成中... (数分かかる場合があります)");
            }
        }
    };

    let result = tokio::select! {
        biased;
        result = controller.upload(file) => result,
        _ = follow_progress => Err(ClientError::CliExecution("進捗の監視が終了しました".into())),
    };

    bar.finish_and_clear();
    result
}

/// 対話モードを実行
pub async fn run_session<A: SummaryApi + ?Sized>(
    controller: &WorkflowController<A>,
    base_url: &str,
) -> Result<()> {
    println!("📄 pdf-summary - 対話モード\n");

    println!("バックエンドに接続中... ({})", base_url);
    controller.start().await;

    while !controller.upload_enabled() {
        println!("✖ Backend Unavailable");
        println!("  サーバーに接続できません。バックエンドが起動しているか確認してください: {}", base_url);

        if !confirm("再試行しますか？")? {
            return Ok(());
        }
        controller.check_backend_health().await;
    }
    println!("✔ 接続OK\n");

    print_history(controller);

    loop {
        let state = controller.upload_state();
        println!("\n{}", status_line(&state));

        let has_history = !controller.history_state().documents.is_empty();
        let actions = SessionAction::menu(&state, has_history);
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();

        let selected = Select::new()
            .with_prompt("操作を選択")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| ClientError::CliExecution(e.to_string()))?;

        match actions[selected] {
            SessionAction::UploadAnother => {
                controller.reset();
                prompt_and_upload(controller).await?;
            }
            SessionAction::Upload => prompt_and_upload(controller).await?,
            SessionAction::OpenDocument => open_from_history(controller).await?,
            SessionAction::RefreshHistory => {
                if let Err(e) = controller.refresh_history().await {
                    println!("✖ 履歴の取得に失敗: {}", e);
                }
                print_history(controller);
            }
            SessionAction::Quit => break,
        }
    }

    Ok(())
}

async fn prompt_and_upload<A: SummaryApi + ?Sized>(controller: &WorkflowController<A>) -> Result<()> {
    let input: String = Input::new()
        .with_prompt("PDFファイルのパス")
        .interact_text()
        .map_err(|e| ClientError::CliExecution(e.to_string()))?;

    let file = match PdfFile::from_path(&normalize_input_path(&input)) {
        Ok(file) => file,
        Err(e) => {
            println!("✖ {}", e);
            return Ok(());
        }
    };

    match upload_with_progress(controller, file).await {
        Ok(document) => {
            println!("✔ Document successfully processed!\n");
            println!("{}", render_summary(&document));
            print_history(controller);
        }
        Err(e) => println!("✖ {}", e),
    }
    Ok(())
}

async fn open_from_history<A: SummaryApi + ?Sized>(controller: &WorkflowController<A>) -> Result<()> {
    let history = controller.history_state();
    let rows = history_rows(&history.documents);
    if rows.is_empty() {
        return Ok(());
    }

    let labels: Vec<String> = rows
        .iter()
        .map(|r| format!("{}  ({}, {})", r.filename, r.size, r.date))
        .collect();

    let selected = Select::new()
        .with_prompt("ドキュメントを選択")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| ClientError::CliExecution(e.to_string()))?;

    match controller.open_document(&rows[selected].id).await {
        Ok(document) => println!("\n{}", render_summary(&document)),
        Err(e) => println!("✖ {}", e),
    }
    Ok(())
}

fn print_history<A: SummaryApi + ?Sized>(controller: &WorkflowController<A>) {
    let history = controller.history_state();
    if let Some(error) = &history.last_error {
        println!("⚠ 履歴の取得に失敗: {}", error);
    }
    print!("{}", render_history(&history.documents));
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(|e| ClientError::CliExecution(e.to_string()))
}
