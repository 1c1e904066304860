//! PDF要約サービスのクライアント
//!
//! - gateway: バックエンドAPIの呼び出しとエラー正規化
//! - workflow: アップロードの状態遷移と履歴の再読み込み
//! - display / session: ターミナル表示と対話モード

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod pdf_file;
pub mod session;
pub mod workflow;
