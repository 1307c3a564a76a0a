//! メモ自身の ttlDays による期限判定
//!
//! キャッシュの保存期限（TtlStore）とは別の判定。純粋関数。

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::memo::{Memo, ReceivedMemo};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// `created_at + ttl_days` 日を過ぎていれば true。
///
/// ttl_days が無い・0 以下なら期限なし。created_at が解釈できなければ期限切れにしない。
pub fn is_expired(ttl_days: Option<i64>, created_at: &str, now_ms: i64) -> bool {
    let Some(days) = ttl_days.filter(|d| *d > 0) else {
        return false;
    };
    let Some(created) = parse_timestamp_ms(created_at) else {
        return false;
    };
    match days
        .checked_mul(DAY_MS)
        .and_then(|ttl| created.checked_add(ttl))
    {
        Some(expiry) => now_ms > expiry,
        None => false,
    }
}

/// RFC3339 / タイムゾーン無しの日時（UTC とみなす）/ 日付のみ を Unix ms に変換する
pub fn parse_timestamp_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

impl Memo {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        is_expired(self.ttl_days, &self.created_at, now_ms)
    }
}

impl ReceivedMemo {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.memo.is_expired_at(now_ms)
    }
}
