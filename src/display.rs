//! ターミナル表示
//!
//! 結果表示・履歴一覧・状態行の文字列を組み立てる（出力は呼び出し側）。

use crate::workflow::{UploadPhase, UploadState};
use pdf_summary_common::{format_date, format_file_size, DocumentHistoryEntry, DocumentSummary};

pub const EMPTY_HISTORY_MESSAGE: &str = "No processed documents yet";

/// 一覧で表示する要約の最大文字数
const PREVIEW_CHARS: usize = 160;
/// 一覧で表示する要約の最大行数
const PREVIEW_LINES: usize = 3;

/// 履歴一覧の1行分（整形済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: String,
    pub filename: String,
    pub size: String,
    pub pages: String,
    pub date: String,
    pub preview: String,
}

impl From<&DocumentHistoryEntry> for HistoryRow {
    fn from(entry: &DocumentHistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            filename: entry.filename.clone(),
            size: format_file_size(entry.file_size),
            pages: format!("{} pages", entry.page_count),
            date: format_date(&entry.upload_date),
            preview: summary_preview(&entry.summary),
        }
    }
}

/// バックエンドの順序のまま行に変換
pub fn history_rows(entries: &[DocumentHistoryEntry]) -> Vec<HistoryRow> {
    entries.iter().map(HistoryRow::from).collect()
}

pub fn render_history(entries: &[DocumentHistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("Document History\n  {}\n", EMPTY_HISTORY_MESSAGE);
    }

    let mut out = format!("Document History ({})\n", entries.len());
    for (i, row) in history_rows(entries).iter().enumerate() {
        out.push_str(&format!(
            "  {}. {}  |  {}  |  {}  |  {}\n",
            i + 1,
            row.filename,
            row.size,
            row.pages,
            row.date
        ));
        if !row.preview.is_empty() {
            out.push_str(&format!("     {}\n", row.preview));
        }
    }
    out
}

pub fn render_summary(document: &DocumentSummary) -> String {
    let mut out = String::from("Processing Result\n");
    out.push_str(&format!("  File:   {}\n", document.filename));
    out.push_str(&format!("  Size:   {}\n", format_file_size(document.file_size)));
    out.push_str(&format!("  Pages:  {}\n", document.page_count));
    out.push_str(&format!("  Date:   {}\n", format_date(&document.upload_date)));
    out.push_str(&format!("  ID:     {}\n", document.id));
    out.push_str("\nDocument Summary\n");
    for line in document.summary.lines() {
        out.push_str(&format!("  {}\n", line));
    }
    out
}

/// 現在のアップロード状態を1行で表す
pub fn status_line(state: &UploadState) -> String {
    match state.phase() {
        UploadPhase::Idle => "Ready to upload".to_string(),
        UploadPhase::Uploading => format!("Uploading... {}%", state.progress()),
        UploadPhase::Succeeded => match state.result() {
            Some(doc) => format!("Document successfully processed: {}", doc.filename),
            None => "Document successfully processed".to_string(),
        },
        UploadPhase::Failed => format!("Error: {}", state.error().unwrap_or_default()),
    }
}

/// 要約の先頭数行を1行に詰めて切り詰める
pub fn summary_preview(summary: &str) -> String {
    let joined = summary
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() <= PREVIEW_CHARS {
        return joined;
    }
    let truncated: String = joined.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", truncated.trim_end())
}
