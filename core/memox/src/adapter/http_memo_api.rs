//! MemoApi の HTTP 実装（reqwest blocking）
//!
//! すべてのリクエストに TokenSource から取得した bearer トークンを付ける。
//! トークン取得はリクエストごとに有限回リトライされる。

use crate::domain::{Memo, MemoStatus, SendMemoRequest};
use crate::ports::outbound::MemoApi;
use common::auth::TokenSource;
use common::error::Error;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpMemoApi {
    base_url: String,
    client: Client,
    tokens: Arc<TokenSource>,
}

impl HttpMemoApi {
    /// `base_url` はサーバーのルート（`/api` はこちらで付ける）
    pub fn new(base_url: &str, tokens: Arc<TokenSource>) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// `/api/memos/{id}` に続くパス。ID は 1 セグメントとしてエンコードする
    fn memo_url(&self, id: &str, suffix: Option<&str>) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url("/memos"))
            .map_err(|e| Error::config(format!("Invalid API URL '{}': {}", self.base_url, e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::config(format!("API URL cannot carry a path: {}", self.base_url))
            })?;
            segments.push(id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    fn execute(&self, builder: RequestBuilder) -> Result<String, Error> {
        let token = self.tokens.acquire()?;
        let response = builder
            .bearer_auth(token)
            .send()
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::http(error_message(status, &response_text)));
        }
        Ok(response_text)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let text = self.execute(self.client.get(self.url(path)).query(query))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::json(format!("Failed to parse response from {}: {}", path, e)))
    }
}

/// limit / offset は 0 のとき送らない
pub(crate) fn page_query(limit: usize, offset: usize) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if limit > 0 {
        query.push(("limit", limit.to_string()));
    }
    if offset > 0 {
        query.push(("offset", offset.to_string()));
    }
    query
}

/// エラーレスポンス（`{"error": "..."}`）からメッセージを取り出す
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match &v["error"] {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("message").and_then(|m| m.as_str()).map(String::from),
            _ => None,
        })
        .map(|msg| format!("HTTP {}: {}", status, msg))
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body))
}

impl MemoApi for HttpMemoApi {
    fn sent_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        self.get_json("/memos/sent", &page_query(limit, offset))
    }

    fn received_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        self.get_json("/memos/received", &page_query(limit, offset))
    }

    fn send_memo(&self, request: &SendMemoRequest) -> Result<Memo, Error> {
        let text = self.execute(self.client.post(self.url("/memos")).json(request))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::json(format!("Failed to parse created memo: {}", e)))
    }

    fn update_status(&self, id: &str, status: MemoStatus) -> Result<(), Error> {
        let url = self.memo_url(id, Some("status"))?;
        self.execute(
            self.client
                .put(url)
                .json(&json!({ "status": status.as_str() })),
        )?;
        Ok(())
    }

    fn delete_memo(&self, id: &str) -> Result<(), Error> {
        let url = self.memo_url(id, None)?;
        self.execute(self.client.delete(url))?;
        Ok(())
    }

    fn users(&self) -> Result<Vec<String>, Error> {
        self.get_json("/users", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::{NoopLog, RecordingSleeper, StaticTokenProvider};
    use common::retry::RetryPolicy;
    use reqwest::StatusCode;

    fn api(base: &str) -> HttpMemoApi {
        let tokens = TokenSource::new(
            Arc::new(StaticTokenProvider::dev()),
            Arc::new(RecordingSleeper::new()),
            RetryPolicy::token(),
            Arc::new(NoopLog),
        );
        HttpMemoApi::new(base, Arc::new(tokens)).unwrap()
    }

    #[test]
    fn test_url_appends_api_prefix() {
        let api = api("http://127.0.0.1:8080/");
        assert_eq!(api.url("/memos/sent"), "http://127.0.0.1:8080/api/memos/sent");
    }

    #[test]
    fn test_memo_url_encodes_id_as_one_segment() {
        let api = api("http://127.0.0.1:8080");
        assert_eq!(
            api.memo_url("m-1", Some("status")).unwrap().as_str(),
            "http://127.0.0.1:8080/api/memos/m-1/status"
        );
        assert_eq!(
            api.memo_url("../users?x#y", None).unwrap().as_str(),
            "http://127.0.0.1:8080/api/memos/..%2Fusers%3Fx%23y"
        );
    }

    #[test]
    fn test_page_query_omits_zero_values() {
        assert_eq!(
            page_query(10, 0),
            vec![("limit", "10".to_string())]
        );
        assert_eq!(
            page_query(10, 20),
            vec![("limit", "10".to_string()), ("offset", "20".to_string())]
        );
        assert!(page_query(0, 0).is_empty());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"TTL must be at least 1 day"}"#),
            "HTTP 400 Bad Request: TTL must be at least 1 day"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "HTTP 502 Bad Gateway: upstream down"
        );
    }
}
