use crate::gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    InvalidFile(String),

    #[error("アップロード処理中です。完了するまで次のファイルは送信できません")]
    UploadInProgress,

    #[error("バックエンドに接続できません。`pdf-summary health` で状態を確認してください")]
    BackendUnavailable,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
