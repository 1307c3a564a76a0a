//! memox 固有のアダプタ（HTTP バックエンド・設定）

pub(crate) mod config;
pub(crate) mod http_memo_api;
pub(crate) mod logging_memo_api;

pub(crate) use config::{load_config, AppConfig};
pub(crate) use http_memo_api::HttpMemoApi;
pub(crate) use logging_memo_api::LoggingMemoApi;
