//! ネイティブストレージ優先・ローカルフォールバックの KeyValueStore
//!
//! ネイティブ側が無い（ブラウザ相当のテスト実行）ときはフォールバックを使う。
//! フォールバックへの書き込み失敗はログに残して握りつぶす。

use crate::error::Error;
use crate::ports::outbound::{KeyValueStore, Log, LogLevel, LogRecord};
use std::sync::Arc;

pub struct BridgeKeyValueStore {
    native: Option<Arc<dyn KeyValueStore>>,
    fallback: Arc<dyn KeyValueStore>,
    log: Arc<dyn Log>,
}

impl BridgeKeyValueStore {
    pub fn new(
        native: Option<Arc<dyn KeyValueStore>>,
        fallback: Arc<dyn KeyValueStore>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            native,
            fallback,
            log,
        }
    }

    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }

    fn warn_fallback(&self, op: &str, key: &str, e: &Error) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Warn, "fallback storage write failed")
                .layer("adapter")
                .kind("storage")
                .field("operation", op)
                .field("key", key)
                .field("error", e.to_string()),
        );
    }
}

impl KeyValueStore for BridgeKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match &self.native {
            Some(native) => native.get(key),
            None => self.fallback.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        if let Some(native) = &self.native {
            return native.set(key, value);
        }
        if let Err(e) = self.fallback.set(key, value) {
            self.warn_fallback("set", key, &e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        if let Some(native) = &self.native {
            return native.remove(key);
        }
        if let Err(e) = self.fallback.remove(key) {
            self.warn_fallback("remove", key, &e);
        }
        Ok(())
    }
}
