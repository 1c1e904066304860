use clap::Parser;
use pdf_summary_client::{cli, config, display, error, gateway, logging, pdf_file, session, workflow};
use cli::{Cli, Commands, OutputFormat};
use config::Config;
use error::{ClientError, Result};
use gateway::{ApiClient, TracingObserver};
use pdf_file::PdfFile;
use std::sync::Arc;
use workflow::WorkflowController;

fn build_controller(config: &Config) -> Result<WorkflowController<ApiClient>> {
    let client = ApiClient::new(config.gateway.clone())?.with_observer(Arc::new(TracingObserver));
    Ok(WorkflowController::new(Arc::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { set_api_url, set_upload_timeout, set_metadata_timeout, show } => {
            configure(set_api_url, set_upload_timeout, set_metadata_timeout, show)
        }
        command => run(command, cli.verbose, cli.api_url.as_deref()).await,
    }
}

/// 設定コマンド（ファイルの内容だけを扱い、環境変数・--api-urlは反映しない）
fn configure(
    set_api_url: Option<String>,
    set_upload_timeout: Option<u64>,
    set_metadata_timeout: Option<u64>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load_from(&Config::config_path()?)?;
    let mut changed = false;

    if let Some(url) = set_api_url {
        config.set_base_url(&url)?;
        changed = true;
    }
    if let Some(secs) = set_upload_timeout {
        config.set_upload_timeout_secs(secs)?;
        changed = true;
    }
    if let Some(secs) = set_metadata_timeout {
        config.set_metadata_timeout_secs(secs)?;
        changed = true;
    }
    if changed {
        config.save()?;
        println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
    }

    if show || !changed {
        println!("設定:");
        println!("  APIのURL: {}", config.gateway.base_url);
        println!("  アップロードのタイムアウト: {}ms", config.gateway.upload_timeout_ms);
        println!("  その他のタイムアウト: {}ms", config.gateway.metadata_timeout_ms);
        println!("  ログレベル: {}", config.log_level);
    }
    Ok(())
}

async fn run(command: Commands, verbose: bool, api_url: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = api_url {
        config.set_base_url(url)?;
    }
    logging::init_tracing(if verbose { "debug" } else { config.log_level.as_str() });

    let controller = build_controller(&config)?;
    let base_url = config.gateway.base_url.clone();

    match command {
        Commands::Health => {
            if controller.check_backend_health().await {
                println!("✔ バックエンドに接続できます: {}", base_url);
            } else {
                println!("✖ バックエンドに接続できません: {}", base_url);
                return Err(ClientError::BackendUnavailable);
            }
        }

        Commands::Upload { file, format } => {
            let pdf = PdfFile::from_path(&file)?;

            if format == OutputFormat::Text {
                println!("📄 pdf-summary - アップロード\n");
                println!("[1/2] バックエンドに接続中...");
            }
            controller.start().await;
            if !controller.upload_enabled() {
                println!("✖ バックエンドに接続できません: {}", base_url);
                return Err(ClientError::BackendUnavailable);
            }

            if format == OutputFormat::Text {
                println!("✔ 接続OK\n");
                println!("[2/2] {} をアップロード中...", pdf.file_name);
            }
            let document = session::upload_with_progress(&controller, pdf).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&document)?);
                }
                OutputFormat::Text => {
                    println!("✔ Document successfully processed!\n");
                    println!("{}", display::render_summary(&document));

                    let history = controller.history_state();
                    if let Some(error) = &history.last_error {
                        println!("⚠ 履歴の取得に失敗: {}", error);
                    }
                    print!("{}", display::render_history(&history.documents));
                }
            }
        }

        Commands::History { format } => {
            controller.refresh_history().await?;
            let history = controller.history_state();

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&history.documents)?);
                }
                OutputFormat::Text => print!("{}", display::render_history(&history.documents)),
            }
        }

        Commands::Show { id, format } => {
            let document = controller.open_document(&id).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
                OutputFormat::Text => println!("{}", display::render_summary(&document)),
            }
        }

        Commands::Session => {
            session::run_session(&controller, &base_url).await?;
        }

        Commands::Config { .. } => {} // configure() で処理済み
    }

    Ok(())
}
