//! 時刻 Outbound ポート
//!
//! usecase はこの trait 経由で「現在時刻」を取得し、TTL 判定や savedAt の付与に使う。

/// 時刻取得の抽象
///
/// 実装は `common::adapter::StdClock` やテスト用の固定時刻など。
pub trait Clock: Send + Sync {
    /// 現在時刻をミリ秒（Unix epoch）で返す
    fn now_ms(&self) -> u64;

    /// 現在時刻を RFC3339 文字列で返す
    fn now_rfc3339(&self) -> String {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.now_ms() as i64)
            .unwrap_or_default()
            .to_rfc3339()
    }
}
