//! 待機 Outbound ポート
//!
//! リトライ間隔やポーリング間隔の待機を抽象化し、テストでは実時間を使わない。

use std::time::Duration;

/// 待機の抽象
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}
