//! 一覧の絞り込み条件（検索語・日付範囲・全員宛てのみ）

use chrono::NaiveDate;
use common::error::Error;

use super::expiry::parse_timestamp_ms;
use super::memo::{Memo, ReceivedMemo};

/// 絞り込みに使う項目
pub trait Filterable {
    fn subject(&self) -> &str;
    fn message(&self) -> &str;
    fn from(&self) -> &str;
    fn to(&self) -> &str;
    /// 日付範囲の判定に使う日時（端末保存分は savedAt、送信分は createdAt）
    fn display_date(&self) -> &str;
    fn is_broadcast(&self) -> bool;
    fn id(&self) -> &str;
}

impl Filterable for Memo {
    fn subject(&self) -> &str {
        &self.subject
    }
    fn message(&self) -> &str {
        &self.message
    }
    fn from(&self) -> &str {
        &self.from
    }
    fn to(&self) -> &str {
        &self.to
    }
    fn display_date(&self) -> &str {
        &self.created_at
    }
    fn is_broadcast(&self) -> bool {
        self.is_broadcast
    }
    fn id(&self) -> &str {
        &self.id
    }
}

impl Filterable for ReceivedMemo {
    fn subject(&self) -> &str {
        &self.memo.subject
    }
    fn message(&self) -> &str {
        &self.memo.message
    }
    fn from(&self) -> &str {
        &self.memo.from
    }
    fn to(&self) -> &str {
        &self.memo.to
    }
    fn display_date(&self) -> &str {
        &self.saved_at
    }
    fn is_broadcast(&self) -> bool {
        self.memo.is_broadcast
    }
    fn id(&self) -> &str {
        &self.memo.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoFilter {
    /// 件名・本文・送信者・宛先の部分一致（大文字小文字を区別しない）
    pub search: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub broadcast_only: bool,
}

impl MemoFilter {
    /// 何も絞り込まない
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches<M: Filterable>(&self, memo: &M) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let hit = [memo.subject(), memo.message(), memo.from(), memo.to()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        // 日付が読めないメモは日付条件では落とさない
        if self.start_date.is_some() || self.end_date.is_some() {
            if let Some(day) = memo_day(memo.display_date()) {
                if self.start_date.is_some_and(|start| day < start) {
                    return false;
                }
                if self.end_date.is_some_and(|end| day > end) {
                    return false;
                }
            }
        }

        !(self.broadcast_only && !memo.is_broadcast())
    }

    pub fn apply<'a, M: Filterable>(&self, memos: &'a [M]) -> Vec<&'a M> {
        memos.iter().filter(|m| self.matches(*m)).collect()
    }
}

fn memo_day(s: &str) -> Option<NaiveDate> {
    let ms = parse_timestamp_ms(s)?;
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

/// CLI の日付引数（YYYY-MM-DD）
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::invalid_argument(format!("invalid date '{}': expected YYYY-MM-DD", s)))
}
