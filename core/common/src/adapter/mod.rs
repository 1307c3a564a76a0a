//! アダプター（Outbound ポートの標準実装とテスト用実装）
//!
//! usecase は ports::outbound の trait 経由でのみファイル・時刻・ストレージに触れる。
//! 実装は標準実装（Std*）やテスト用の実装（Memory* / Recording* / Manual*）を注入する。

pub mod bridge_kv_store;
pub mod console_alert;
pub mod file_json_log;
pub mod file_kv_store;
pub mod memory_kv_store;
pub mod std_clock;
pub mod std_env_resolver;
pub mod std_fs;
pub mod std_sleeper;
pub mod token_provider;

pub use bridge_kv_store::BridgeKeyValueStore;
pub use console_alert::{ConsoleAlert, RecordingAlert};
pub use file_json_log::{FileJsonLog, MemoryLog, NoopLog};
pub use file_kv_store::FileKeyValueStore;
pub use memory_kv_store::MemoryKeyValueStore;
pub use std_clock::{ManualClock, StdClock};
pub use std_env_resolver::StdEnvResolver;
pub use std_fs::StdFileSystem;
pub use std_sleeper::{RecordingSleeper, StdSleeper};
pub use token_provider::{FileTokenProvider, StaticTokenProvider, DEV_TOKEN};
