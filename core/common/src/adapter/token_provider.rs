//! TokenProvider の実装
//!
//! - FileTokenProvider: ホストシェルが書き出したトークンファイルを読む
//! - StaticTokenProvider: ホストが無いテスト実行用の固定トークン

use crate::error::Error;
use crate::ports::outbound::{FileSystem, TokenProvider};
use std::path::PathBuf;
use std::sync::Arc;

/// ホスト不在時に使う開発用トークン
pub const DEV_TOKEN: &str = "dev-token";

pub struct FileTokenProvider {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileTokenProvider {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl TokenProvider for FileTokenProvider {
    fn request_token(&self) -> Result<Option<String>, Error> {
        // ホストがまだ書き出していない場合は None（リトライ対象）
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }
        let raw = self.fs.read_to_string(&self.path)?;
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn dev() -> Self {
        Self::new(DEV_TOKEN)
    }
}

impl TokenProvider for StaticTokenProvider {
    fn request_token(&self) -> Result<Option<String>, Error> {
        Ok(Some(self.token.clone()))
    }
}
