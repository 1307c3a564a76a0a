//! `<home>/config.json` の読み込み（adapter 層）
//!
//! ファイルが無ければ既定値。壊れていれば設定エラー（終了コード 78）。

use common::domain::dirs::Dirs;
use common::error::Error;
use common::ports::outbound::{EnvResolver, FileSystem};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_url: String,
    pub page_size: usize,
    pub poll_interval_ms: u64,
    pub cache_ttl_days: u32,
    /// ホストシェルが書き出すトークンファイル。None なら開発用トークンで動く
    pub token_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            token_file: None,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(self) -> Result<Self, Error> {
        if self.page_size == 0 {
            return Err(Error::config("config.json: pageSize must be at least 1"));
        }
        if self.cache_ttl_days == 0 {
            return Err(Error::config("config.json: cacheTtlDays must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("config.json: pollIntervalMs must be at least 1"));
        }
        Ok(self)
    }
}

/// config.json を読み、環境変数（MEMOX_API_URL / MEMOX_TOKEN_FILE）で上書きする。
/// 相対パスの tokenFile はホームディレクトリ基準で解決する。
pub fn load_config(
    fs: &dyn FileSystem,
    env: &dyn EnvResolver,
    dirs: &Dirs,
) -> Result<AppConfig, Error> {
    let path = dirs.config_path();
    let mut config = if fs.exists(&path) {
        let content = fs.read_to_string(&path)?;
        parse_config(&content)?
    } else {
        AppConfig::default()
    };

    if let Some(url) = env.var("MEMOX_API_URL") {
        config.api_url = url;
    }
    if let Some(file) = env.var("MEMOX_TOKEN_FILE") {
        config.token_file = Some(PathBuf::from(file));
    }
    if let Some(file) = config.token_file.take() {
        config.token_file = Some(if file.is_relative() {
            dirs.home_dir.join(file)
        } else {
            file
        });
    }
    config.validate()
}

fn parse_config(content: &str) -> Result<AppConfig, Error> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_json::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse config.json: {}", e)))
}
