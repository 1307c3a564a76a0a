//! 実行時ディレクトリ（MEMOX_HOME / XDG 解決結果）
//!
//! EnvResolver::resolve_dirs() で取得し、設定・ローカルストレージ・ログのパス計算に使う。

use super::HomeDir;
use std::path::PathBuf;

/// 解決済みのディレクトリ群
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    pub home_dir: PathBuf,
    pub storage_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Dirs {
    pub fn under(home: &HomeDir) -> Self {
        let home_dir = home.to_path_buf();
        Self {
            storage_dir: home_dir.join("storage"),
            logs_dir: home_dir.join("logs"),
            home_dir,
        }
    }

    /// 設定ファイル（home/config.json）
    pub fn config_path(&self) -> PathBuf {
        self.home_dir.join("config.json")
    }

    /// JSONL ログファイル
    pub fn log_file_path(&self) -> PathBuf {
        self.logs_dir.join("memox.jsonl")
    }
}
