//! Outbound ポート: アプリが外界（FS・時刻・待機・ストレージ・トークン・通知・ログ）を使うための trait

pub mod alert;
pub mod clock;
pub mod env_resolver;
pub mod fs;
pub mod kv_store;
pub mod log;
pub mod sleeper;
pub mod token_provider;

pub use alert::Alert;
pub use clock::Clock;
pub use env_resolver::EnvResolver;
pub use fs::FileSystem;
pub use kv_store::KeyValueStore;
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use sleeper::Sleeper;
pub use token_provider::TokenProvider;
