//! 標準環境変数解決実装（std::env を委譲）

use crate::domain::HomeDir;
use crate::error::Error;
use crate::ports::outbound::EnvResolver;
use std::env;
use std::path::PathBuf;

/// 標準環境変数解決実装
#[derive(Debug, Clone, Default)]
pub struct StdEnvResolver;

impl EnvResolver for StdEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }

    fn resolve_home_dir(&self, override_dir: Option<&str>) -> Result<HomeDir, Error> {
        resolve_home_dir_with(override_dir, |name| self.var(name))
    }
}

/// 環境変数の取得方法を差し替えられるホーム解決（テストから直接呼ぶ）
pub(crate) fn resolve_home_dir_with(
    override_dir: Option<&str>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<HomeDir, Error> {
    if let Some(dir) = override_dir.filter(|s| !s.is_empty()) {
        return Ok(HomeDir::new(PathBuf::from(dir)));
    }
    if let Some(home) = var("MEMOX_HOME") {
        return Ok(HomeDir::new(PathBuf::from(home)));
    }

    let config_base = var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or_else(|| Error::env("HOME is not set"))?;

    let mut path = config_base;
    path.push("memox");
    Ok(HomeDir::new(path))
}
