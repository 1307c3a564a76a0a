//! ユーザー通知 Outbound ポート
//!
//! 構造化ログとは別チャネル。ユーザー操作の成否をユーザーに見せるためだけに使う。

/// アラート表示の抽象
pub trait Alert: Send + Sync {
    fn show(&self, title: &str, message: &str);
}
