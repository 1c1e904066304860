use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// ベースURLを上書きする環境変数
pub const API_URL_ENV: &str = "PDF_SUMMARY_API_URL";

/// ゲートウェイクライアントの接続設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub upload_timeout_ms: u64,
    pub metadata_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            upload_timeout_ms: 120_000, // 大きなPDFの要約は数分かかる
            metadata_timeout_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub gateway: GatewayConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            log_level: "warn".into(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数の上書きを適用
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_env_override(std::env::var(API_URL_ENV).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pdf-summary").join("config.json"))
    }

    /// 空でない値が与えられた場合のみベースURLを差し替える
    pub fn with_env_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.gateway.base_url = url.trim().to_string();
        }
        self
    }

    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ClientError::Config(format!("URLが不正です ({}): {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!("http/httpsのURLを指定してください: {}", url)));
        }
        self.gateway.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn set_upload_timeout_secs(&mut self, secs: u64) -> Result<()> {
        self.gateway.upload_timeout_ms = timeout_ms(secs)?;
        Ok(())
    }

    pub fn set_metadata_timeout_secs(&mut self, secs: u64) -> Result<()> {
        self.gateway.metadata_timeout_ms = timeout_ms(secs)?;
        Ok(())
    }
}

fn timeout_ms(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(ClientError::Config("タイムアウトは1秒以上を指定してください".into()));
    }
    Ok(secs.saturating_mul(1000))
}
