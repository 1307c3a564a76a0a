//! 期限なしの永続リスト
//!
//! 削除済み ID・お気に入り・アーカイブのように、ユーザー操作でだけ変わる集合を
//! KeyValueStore の 1 キーに JSON 配列で保存する。

use crate::error::Error;
use crate::ports::outbound::{KeyValueStore, Log, LogLevel, LogRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct ListStore<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    log: Arc<dyn Log>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ListStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, log: Arc<dyn Log>) -> Self {
        Self {
            store,
            key: key.into(),
            log,
            _marker: PhantomData,
        }
    }

    /// 保存済みの要素を返す。未保存・壊れた JSON は空（後者はログに残す）
    pub fn load(&self) -> Result<Vec<T>, Error> {
        Ok(self.read()?.unwrap_or_default())
    }

    /// 未保存なら Some(空)、壊れていれば None（ログ済み）
    fn read(&self) -> Result<Option<Vec<T>>, Error> {
        let raw = match self.store.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(Some(Vec::new())),
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Warn, "failed to parse stored list")
                        .layer("adapter")
                        .kind("storage")
                        .field("key", self.key.as_str())
                        .field("error", e.to_string()),
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, items: &[T]) -> Result<(), Error> {
        let json = serde_json::to_string(items)?;
        self.store.set(&self.key, &json)
    }

    /// 読み出し・変更・書き戻しを 1 回で行う。`f` の戻り値をそのまま返す。
    ///
    /// 保存値が壊れているときは上書きせずにエラーを返す（消せるのは clear だけ）。
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, Error> {
        let Some(mut items) = self.read()? else {
            return Err(Error::json(format!(
                "stored list '{}' is unreadable, refusing to overwrite it",
                self.key
            )));
        };
        let out = f(&mut items);
        self.save(&items)?;
        Ok(out)
    }

    pub fn clear(&self) -> Result<(), Error> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemoryKeyValueStore, MemoryLog};

    #[test]
    fn test_load_missing_and_malformed() {
        let kv = Arc::new(MemoryKeyValueStore::with_entries([("bad", "[1,")]));
        let log = Arc::new(MemoryLog::new());
        let missing: ListStore<String> = ListStore::new(kv.clone(), "missing", log.clone());
        assert!(missing.load().unwrap().is_empty());
        let bad: ListStore<String> = ListStore::new(kv, "bad", log.clone());
        assert!(bad.load().unwrap().is_empty());
        assert_eq!(log.of_kind("storage").len(), 1);
    }

    #[test]
    fn test_update_persists() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let list: ListStore<String> = ListStore::new(kv.clone(), "ids", Arc::new(MemoryLog::new()));
        let len = list
            .update(|ids| {
                ids.push("m1".to_string());
                ids.push("m2".to_string());
                ids.len()
            })
            .unwrap();
        assert_eq!(len, 2);
        assert_eq!(kv.get("ids").unwrap().as_deref(), Some(r#"["m1","m2"]"#));
        list.clear().unwrap();
        assert!(list.load().unwrap().is_empty());
    }

    #[test]
    fn test_update_refuses_to_overwrite_unreadable_list() {
        let kv = Arc::new(MemoryKeyValueStore::with_entries([("ids", r#"["m1","#)]));
        let list: ListStore<String> = ListStore::new(kv.clone(), "ids", Arc::new(MemoryLog::new()));
        let err = list.update(|ids| ids.push("m2".to_string())).unwrap_err();
        assert_eq!(err.exit_code(), 65);
        assert_eq!(kv.get("ids").unwrap().as_deref(), Some(r#"["m1","#));
        list.clear().unwrap();
        list.update(|ids| ids.push("m2".to_string())).unwrap();
        assert_eq!(list.load().unwrap(), vec!["m2"]);
    }
}
