//! リトライポリシーと汎用リトライ実行
//!
//! 待機は Sleeper ポート経由で行うため、テストでは実時間を使わずに回数と間隔を検証できる。

use crate::error::Error;
use crate::ports::outbound::Sleeper;
use std::time::Duration;

/// 最大試行回数と試行間の待機時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// 認証トークン取得用（3 回、500ms 間隔）
    pub const fn token() -> Self {
        Self::new(3, Duration::from_millis(500))
    }

    /// リトライしない（1 回だけ試す）
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// すべての試行が失敗した
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted {
    pub attempts: u32,
    /// 最後の試行がエラーだった場合のエラー（「まだ無い」で終わった場合は None）
    pub last_error: Option<Error>,
}

/// `op` を最大 `policy.max_attempts` 回試す。
///
/// `op` は試行番号（1 始まり）を受け取り、
/// - `Ok(Some(v))`: 成功
/// - `Ok(None)`: まだ用意できていない（リトライ）
/// - `Err(e)`: 失敗（リトライ）
///
/// を返す。待機は試行と試行の間にだけ入る。
pub fn with_retry<T>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: impl FnMut(u32) -> Result<Option<T>, Error>,
) -> Result<T, Exhausted> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match op(attempt) {
            Ok(Some(v)) => return Ok(v),
            Ok(None) => last_error = None,
            Err(e) => last_error = Some(e),
        }
        if attempt < attempts {
            sleeper.sleep(policy.delay);
        }
    }
    Err(Exhausted {
        attempts,
        last_error,
    })
}
