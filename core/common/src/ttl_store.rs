//! TTL 付きの永続コレクション
//!
//! KeyValueStore の 1 キーに、挿入時刻付きの要素列を保存する。
//! 期限切れ要素は読み出し時に取り除かれ、取り除いた結果が書き戻される。
//!
//! 保存形式は `{"version":1,"items":[{"data":..,"timestamp":..}]}`。
//! バージョンの無い旧形式（要素そのものの配列 / `{data,timestamp}` の配列）は
//! 読み出し時に一度だけ変換して書き戻す。

use crate::error::Error;
use crate::ports::outbound::{Clock, KeyValueStore, Log, LogLevel, LogRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// 現行の保存形式のバージョン
pub const ENVELOPE_VERSION: u32 = 1;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// 要素と挿入時刻（Unix ms）。timestamp は挿入時に一度だけ設定される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtlItem<T> {
    pub data: T,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    items: Vec<TtlItem<Value>>,
}

/// 保存値を解釈した結果
struct Decoded {
    items: Vec<TtlItem<Value>>,
    /// 旧形式から変換した（書き戻しが必要）
    migrated: bool,
}

pub struct TtlStore<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TtlStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        ttl_days: u32,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            ttl_ms: u64::from(ttl_days) * DAY_MS,
            clock,
            log,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 期限内の要素を返す。
    ///
    /// 壊れた JSON は空として扱い（ログのみ）、期限切れ要素があれば残りを書き戻す。
    /// 型に合わない要素は 1 件ずつ読み飛ばす。
    pub fn get(&self) -> Result<Vec<T>, Error> {
        let now = self.clock.now_ms();
        let Some(decoded) = self.read(now)? else {
            return Ok(Vec::new());
        };
        let before = decoded.items.len();
        let valid: Vec<TtlItem<Value>> = decoded
            .items
            .into_iter()
            .filter(|item| self.is_fresh(item, now))
            .collect();
        if decoded.migrated || valid.len() != before {
            self.write(&valid)?;
            if valid.len() != before {
                self.debug("expired items purged", before - valid.len());
            }
        }
        // 解釈できない要素は飛ばし、残りは返す（保存値には残す）
        Ok(valid
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item.data) {
                Ok(data) => Some(data),
                Err(e) => {
                    self.warn_skipped(&e.to_string());
                    None
                }
            })
            .collect())
    }

    /// 要素を追加する。既にあれば何もしない。
    ///
    /// `unique_key` を渡すとそのフィールドの値で、無ければ値全体の一致で既存判定する。
    /// 期限切れでまだ残っている要素もここでは取り除かない。
    /// 追加した場合 true。
    pub fn add(&self, item: &T, unique_key: Option<&str>) -> Result<bool, Error> {
        let now = self.clock.now_ms();
        let mut items = self.read(now)?.map(|d| d.items).unwrap_or_default();
        let candidate = serde_json::to_value(item)?;

        let exists = items.iter().any(|existing| match unique_key {
            Some(k) if candidate.is_object() => existing.data.get(k) == candidate.get(k),
            _ => existing.data == candidate,
        });
        if exists {
            return Ok(false);
        }
        items.push(TtlItem {
            data: candidate,
            timestamp: now,
        });
        self.write(&items)?;
        Ok(true)
    }

    /// 条件に合う要素を取り除き、取り除いた件数を返す（0 件なら書き込まない）
    pub fn remove_where(&self, pred: impl Fn(&T) -> bool) -> Result<usize, Error> {
        let now = self.clock.now_ms();
        let Some(decoded) = self.read(now)? else {
            return Ok(0);
        };
        let before = decoded.items.len();
        let kept: Vec<TtlItem<Value>> = decoded
            .items
            .into_iter()
            .filter(|item| match serde_json::from_value::<T>(item.data.clone()) {
                Ok(data) => !pred(&data),
                Err(_) => true,
            })
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write(&kept)?;
        }
        Ok(removed)
    }

    /// 条件に合う要素だけを残す
    pub fn retain(&self, keep: impl Fn(&T) -> bool) -> Result<usize, Error> {
        self.remove_where(|item| !keep(item))
    }

    /// キーごと削除する
    pub fn clear(&self) -> Result<(), Error> {
        self.store.remove(&self.key)
    }

    fn is_fresh(&self, item: &TtlItem<Value>, now: u64) -> bool {
        // timestamp 0 は付与されていないものとして扱う
        item.timestamp > 0 && now.saturating_sub(item.timestamp) < self.ttl_ms
    }

    /// 保存値を読む。未保存なら Some(空)、壊れていれば None（ログ済み）
    fn read(&self, now: u64) -> Result<Option<Decoded>, Error> {
        let raw = match self.store.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                return Ok(Some(Decoded {
                    items: Vec::new(),
                    migrated: false,
                }))
            }
        };
        match decode(&raw, now) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                self.warn_parse(&e.to_string());
                Ok(None)
            }
        }
    }

    fn write(&self, items: &[TtlItem<Value>]) -> Result<(), Error> {
        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            items: items.to_vec(),
        };
        let json = serde_json::to_string(&envelope)?;
        self.store.set(&self.key, &json)
    }

    fn warn_parse(&self, error: &str) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Warn, "failed to parse stored collection")
                .layer("adapter")
                .kind("cache")
                .field("key", self.key.as_str())
                .field("error", error),
        );
    }

    fn warn_skipped(&self, error: &str) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Warn, "skipped unreadable stored item")
                .layer("adapter")
                .kind("cache")
                .field("key", self.key.as_str())
                .field("error", error),
        );
    }

    fn debug(&self, message: &str, count: usize) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, message)
                .layer("adapter")
                .kind("cache")
                .field("key", self.key.as_str())
                .field("count", count),
        );
    }
}

fn decode(raw: &str, now: u64) -> Result<Decoded, Error> {
    let parsed: Value = serde_json::from_str(raw)?;
    if parsed.is_object() && parsed.get("version").is_some() {
        let envelope: Envelope = serde_json::from_value(parsed)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(Error::json(format!(
                "unsupported collection version {}",
                envelope.version
            )));
        }
        return Ok(Decoded {
            items: envelope.items,
            migrated: false,
        });
    }
    match parsed {
        Value::Array(values) => {
            let wrapped = values.first().is_some_and(|first| {
                first.get("data").is_some() && first.get("timestamp").is_some()
            });
            let items = if wrapped {
                serde_json::from_value(Value::Array(values))?
            } else {
                values
                    .into_iter()
                    .map(|data| TtlItem {
                        data,
                        timestamp: now,
                    })
                    .collect()
            };
            Ok(Decoded {
                items,
                migrated: true,
            })
        }
        _ => Err(Error::json("stored collection is neither an array nor an envelope")),
    }
}
