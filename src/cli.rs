use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-summary")]
#[command(about = "PDF要約サービスのクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// APIのベースURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バックエンドの到達確認
    Health,

    /// PDFをアップロードして要約を表示
    Upload {
        /// PDFファイルのパス
        #[arg(required = true)]
        file: PathBuf,

        /// 出力形式 (text/json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// 処理済みドキュメントの履歴を表示
    History {
        /// 出力形式 (text/json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// ドキュメントの詳細を表示
    Show {
        /// ドキュメントID
        #[arg(required = true)]
        id: String,

        /// 出力形式 (text/json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// 対話モード（アップロード・履歴閲覧を繰り返す）
    Session,

    /// 設定の表示・変更
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// アップロードのタイムアウト（秒）
        #[arg(long)]
        set_upload_timeout: Option<u64>,

        /// アップロード以外のタイムアウト（秒）
        #[arg(long)]
        set_metadata_timeout: Option<u64>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}
