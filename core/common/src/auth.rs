//! 認証トークンの取得（有限回リトライ）と JWT クレームの読み出し
//!
//! トークンは署名検証せずにペイロードだけを読む（宛先のユーザー表示に使うのみ）。

use crate::error::Error;
use crate::ports::outbound::{Log, LogLevel, LogRecord, Sleeper, TokenProvider};
use crate::retry::{with_retry, RetryPolicy};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;

/// 取得済みトークンと、そこから読んだユーザー e-mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    /// email → preferred_username → sub の順で採用。読めなければ空文字。
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
struct JwtClaims {
    email: Option<String>,
    preferred_username: Option<String>,
    sub: Option<String>,
}

/// JWT のペイロードからユーザー識別子を取り出す
pub fn decode_email(token: &str) -> Result<String, Error> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::auth("token is not a JWT"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::auth(format!("invalid JWT payload: {}", e)))?;
    let claims: JwtClaims = serde_json::from_slice(&bytes)?;
    Ok(claims
        .email
        .or(claims.preferred_username)
        .or(claims.sub)
        .unwrap_or_default())
}

/// TokenProvider をリトライ付きで呼ぶ取得口
pub struct TokenSource {
    provider: Arc<dyn TokenProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    log: Arc<dyn Log>,
}

impl TokenSource {
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            provider,
            sleeper,
            policy,
            log,
        }
    }

    /// トークンを取得する。すべての試行が失敗したら Error::Auth
    pub fn acquire(&self) -> Result<String, Error> {
        let max = self.policy.max_attempts;
        with_retry(self.policy, self.sleeper.as_ref(), |attempt| {
            let res = self.provider.request_token();
            match &res {
                Ok(None) => self.warn(attempt, max, "token not available".to_string()),
                Err(e) => self.warn(attempt, max, e.to_string()),
                Ok(Some(_)) => {}
            }
            res
        })
        .map_err(|exhausted| {
            let _ = self.log.log(
                &LogRecord::new(LogLevel::Error, "failed to obtain authentication token")
                    .layer("adapter")
                    .kind("auth")
                    .field("attempts", exhausted.attempts),
            );
            Error::auth("Authentication token not available")
        })
    }

    /// トークンを取得し、クレームからユーザー e-mail を読む（読めなければ空文字）
    pub fn token_data(&self) -> Result<TokenData, Error> {
        let token = self.acquire()?;
        let email = match decode_email(&token) {
            Ok(email) => email,
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Warn, "failed to decode JWT token")
                        .layer("adapter")
                        .kind("auth")
                        .field("error", e.to_string()),
                );
                String::new()
            }
        };
        Ok(TokenData { token, email })
    }

    fn warn(&self, attempt: u32, max: u32, reason: String) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Warn, "token request failed, retrying")
                .layer("adapter")
                .kind("auth")
                .field("attempt", attempt)
                .field("max_attempts", max)
                .field("reason", reason),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemoryLog, RecordingSleeper, StaticTokenProvider};
    use std::sync::Mutex;

    /// 呼ばれるたびに用意した応答を順に返す TokenProvider
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<Option<String>, Error>>>,
    }

    impl TokenProvider for ScriptedProvider {
        fn request_token(&self) -> Result<Option<String>, Error> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Ok(None);
            }
            replies.remove(0)
        }
    }

    fn jwt(payload: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decode_email_prefers_email_claim() {
        let token = jwt(r#"{"email":"a@example.com","sub":"123"}"#);
        assert_eq!(decode_email(&token).unwrap(), "a@example.com");
        let token = jwt(r#"{"preferred_username":"bob","sub":"123"}"#);
        assert_eq!(decode_email(&token).unwrap(), "bob");
        let token = jwt(r#"{"sub":"123"}"#);
        assert_eq!(decode_email(&token).unwrap(), "123");
    }

    #[test]
    fn test_decode_email_rejects_non_jwt() {
        assert!(matches!(decode_email("dev-token"), Err(Error::Auth(_))));
    }

    #[test]
    fn test_acquire_retries_then_succeeds() {
        let provider = ScriptedProvider {
            replies: Mutex::new(vec![
                Err(Error::auth("bridge not ready")),
                Ok(None),
                Ok(Some("tok".to_string())),
            ]),
        };
        let sleeper = Arc::new(RecordingSleeper::new());
        let log = Arc::new(MemoryLog::new());
        let source = TokenSource::new(
            Arc::new(provider),
            sleeper.clone(),
            RetryPolicy::token(),
            log.clone(),
        );
        assert_eq!(source.acquire().unwrap(), "tok");
        assert_eq!(sleeper.slept().len(), 2);
        assert_eq!(log.of_kind("auth").len(), 2);
    }

    #[test]
    fn test_acquire_gives_up_after_three_attempts() {
        let provider = ScriptedProvider {
            replies: Mutex::new(Vec::new()),
        };
        let source = TokenSource::new(
            Arc::new(provider),
            Arc::new(RecordingSleeper::new()),
            RetryPolicy::token(),
            Arc::new(MemoryLog::new()),
        );
        let err = source.acquire().unwrap_err();
        assert_eq!(err, Error::auth("Authentication token not available"));
    }

    #[test]
    fn test_token_data_with_undecodable_token_has_empty_email() {
        let source = TokenSource::new(
            Arc::new(StaticTokenProvider::dev()),
            Arc::new(RecordingSleeper::new()),
            RetryPolicy::token(),
            Arc::new(MemoryLog::new()),
        );
        let data = source.token_data().unwrap();
        assert_eq!(data.token, "dev-token");
        assert_eq!(data.email, "");
    }
}
