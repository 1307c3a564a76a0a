//! 環境変数解決 Outbound ポート
//!
//! ホームディレクトリと設定の上書き値を環境変数から解決する。
//! usecase / wiring はこの trait 経由でのみ環境変数にアクセスする。

use crate::domain::{Dirs, HomeDir};
use crate::error::Error;

/// 環境変数解決抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdEnvResolver` やテスト用のモックなど。
pub trait EnvResolver: Send + Sync {
    /// 環境変数を取得する（未設定・空文字は None）
    fn var(&self, name: &str) -> Option<String>;

    /// ホームディレクトリを解決する
    ///
    /// 優先順位:
    /// 1. `override_dir`（CLI の --home-dir）
    /// 2. MEMOX_HOME
    /// 3. $XDG_CONFIG_HOME/memox
    /// 4. $HOME/.config/memox
    fn resolve_home_dir(&self, override_dir: Option<&str>) -> Result<HomeDir, Error>;

    /// ホーム配下の config / storage / logs を解決する
    fn resolve_dirs(&self, override_dir: Option<&str>) -> Result<Dirs, Error> {
        Ok(Dirs::under(&self.resolve_home_dir(override_dir)?))
    }
}
