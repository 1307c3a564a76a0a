//! 認証トークン Outbound ポート
//!
//! ホスト側（ネイティブシェル）が保持する bearer トークンを取り出す。

use crate::error::Error;

/// トークン取得の抽象
pub trait TokenProvider: Send + Sync {
    /// トークンを要求する。まだ用意されていなければ `Ok(None)`（呼び出し側でリトライする）
    fn request_token(&self) -> Result<Option<String>, Error>;
}
