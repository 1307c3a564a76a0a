//! 既知ユーザー（宛先候補）の取得

use std::sync::Arc;
use std::time::Duration;

use common::ports::outbound::{Log, LogLevel, LogRecord, Sleeper};
use common::retry::{with_retry, RetryPolicy};

use crate::ports::outbound::MemoApi;

/// 初回 + 3 回リトライ、1 秒間隔
pub const USERS_RETRY: RetryPolicy = RetryPolicy::new(4, Duration::from_secs(1));

pub struct KnownUsers {
    api: Arc<dyn MemoApi>,
    sleeper: Arc<dyn Sleeper>,
    log: Arc<dyn Log>,
    policy: RetryPolicy,
}

impl KnownUsers {
    pub fn new(api: Arc<dyn MemoApi>, sleeper: Arc<dyn Sleeper>, log: Arc<dyn Log>) -> Self {
        Self {
            api,
            sleeper,
            log,
            policy: USERS_RETRY,
        }
    }

    /// ユーザー一覧を返す。エラーと空の一覧はどちらもリトライし、最後まで取れなければ空
    pub fn load(&self) -> Vec<String> {
        let result = with_retry(self.policy, self.sleeper.as_ref(), |attempt| {
            match self.api.users() {
                Ok(users) if !users.is_empty() => Ok(Some(users)),
                Ok(_) => {
                    self.retrying(attempt, "no users returned".to_string());
                    Ok(None)
                }
                Err(e) => {
                    self.retrying(attempt, e.to_string());
                    Err(e)
                }
            }
        });
        match result {
            Ok(users) => users,
            Err(exhausted) => {
                let mut rec = LogRecord::new(LogLevel::Warn, "known users unavailable")
                    .layer("usecase")
                    .kind("users")
                    .field("attempts", exhausted.attempts);
                if let Some(e) = exhausted.last_error {
                    rec = rec.field("error", e.to_string());
                }
                let _ = self.log.log(&rec);
                Vec::new()
            }
        }
    }

    fn retrying(&self, attempt: u32, reason: String) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "failed to load users")
                .layer("usecase")
                .kind("users")
                .field("attempt", attempt)
                .field("reason", reason),
        );
    }
}
