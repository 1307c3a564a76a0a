//! メモの同期・表示状態・削除・送信のユースケース
//!
//! 受信一覧と送信一覧はそれぞれ独立した状態（表示中のメモ・offset・has_more・読み込み中フラグ）を
//! Mutex で保持する。読み込み中に来た 2 回目の読み込みは待たずに捨てる（`LoadOutcome::Skipped`）。
//!
//! 受信メモは端末側の TTL キャッシュが正で、サーバーからは新着だけを取り込む。
//! 端末で削除した ID は削除済み ID 集合（墓標）に残し、再同期で復活させない。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use common::error::Error;
use common::list_store::ListStore;
use common::ports::outbound::{Alert, Clock, Log, LogLevel, LogRecord};
use common::ttl_store::TtlStore;
use regex::Regex;

use crate::domain::{Memo, MemoStatus, ReceivedMemo, SendMemoRequest};
use crate::ports::outbound::MemoApi;

pub const RECEIVED_MEMOS_KEY: &str = "memox:received-memos";
pub const DELETED_IDS_KEY: &str = "memox:deleted-ids";

pub const ALERT_SUCCESS: &str = "Success";
pub const ALERT_ERROR: &str = "Error";
pub const ALERT_MEMO_SENT: &str = "Memo sent successfully!";
pub const ALERT_SEND_FAILED: &str = "Failed to send memo. Please try again.";
pub const ALERT_DELETE_FAILED: &str = "Failed to delete memo";
pub const ALERT_LOAD_FAILED: &str = "Failed to load received memos";

pub const MIN_TTL_DAYS: i64 = 1;
pub const MAX_TTL_DAYS: i64 = 365;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// 読み込みの起点。Background の失敗はログのみでユーザーに通知しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    User,
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// サーバーから `fetched` 件取得し、うち `new` 件を端末に保存した（送信一覧では new = 0）
    Loaded { fetched: usize, new: usize },
    /// 同じ一覧の読み込みが進行中だった
    Skipped,
    /// 失敗。表示中の一覧は変わらない
    Failed(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// 同じ ID の削除が進行中だった
    AlreadyInProgress,
}

/// メモ送信の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitMemo {
    pub to: String,
    pub subject: String,
    pub message: String,
    pub is_broadcast: bool,
    pub ttl_days: Option<i64>,
}

impl SubmitMemo {
    /// 宛先・TTL を検証してリクエストにする
    pub fn validate(&self) -> Result<SendMemoRequest, Error> {
        if !self.is_broadcast {
            let to = self.to.trim();
            if to.is_empty() {
                return Err(Error::invalid_argument("Please enter a recipient email"));
            }
            let email = Regex::new(EMAIL_PATTERN)
                .map_err(|e| Error::system(format!("invalid e-mail pattern: {}", e)))?;
            if !email.is_match(to) {
                return Err(Error::invalid_argument(format!(
                    "Recipient is not a valid e-mail address: {}",
                    to
                )));
            }
        }
        if let Some(days) = self.ttl_days {
            if !(MIN_TTL_DAYS..=MAX_TTL_DAYS).contains(&days) {
                return Err(Error::invalid_argument(format!(
                    "TTL must be between {} and {} days",
                    MIN_TTL_DAYS, MAX_TTL_DAYS
                )));
            }
        }
        Ok(SendMemoRequest::new(
            &self.to,
            &self.subject,
            &self.message,
            self.is_broadcast,
            self.ttl_days,
        ))
    }
}

#[derive(Debug)]
struct StreamState<T> {
    items: Vec<T>,
    offset: usize,
    has_more: bool,
    loading: bool,
}

impl<T> Default for StreamState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            has_more: true,
            loading: false,
        }
    }
}

/// 読み込み中フラグを持つ間だけ生きるガード。drop でフラグを下ろす
struct LoadGuard<'a, T> {
    stream: &'a Mutex<StreamState<T>>,
    offset: usize,
}

impl<T> Drop for LoadGuard<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut s) = self.stream.lock() {
            s.loading = false;
        }
    }
}

/// 削除中 ID の集合から自分の ID を外すガード
struct DeleteGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for DeleteGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.in_flight.lock() {
            ids.remove(&self.id);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    m.lock().map_err(|_| Error::system("memo state lock poisoned"))
}

/// 読み込み中でなければフラグを立ててガードを返す。読み込み中なら None
fn begin_load<T>(stream: &Mutex<StreamState<T>>, append: bool) -> Result<Option<LoadGuard<'_, T>>, Error> {
    let mut s = lock(stream)?;
    if s.loading {
        return Ok(None);
    }
    s.loading = true;
    let offset = if append { s.offset } else { 0 };
    Ok(Some(LoadGuard { stream, offset }))
}

pub struct MemoRepository {
    api: Arc<dyn MemoApi>,
    cache: TtlStore<ReceivedMemo>,
    deleted: ListStore<String>,
    clock: Arc<dyn Clock>,
    alert: Arc<dyn Alert>,
    log: Arc<dyn Log>,
    page_size: usize,
    received: Mutex<StreamState<ReceivedMemo>>,
    sent: Mutex<StreamState<Memo>>,
    deleting: Mutex<HashSet<String>>,
}

impl MemoRepository {
    pub fn new(
        api: Arc<dyn MemoApi>,
        cache: TtlStore<ReceivedMemo>,
        deleted: ListStore<String>,
        clock: Arc<dyn Clock>,
        alert: Arc<dyn Alert>,
        log: Arc<dyn Log>,
        page_size: usize,
    ) -> Self {
        Self {
            api,
            cache,
            deleted,
            clock,
            alert,
            log,
            page_size,
            received: Mutex::new(StreamState::default()),
            sent: Mutex::new(StreamState::default()),
            deleting: Mutex::new(HashSet::new()),
        }
    }

    // ---- 表示状態 ----

    pub fn received(&self) -> Vec<ReceivedMemo> {
        self.received.lock().map(|s| s.items.clone()).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<Memo> {
        self.sent.lock().map(|s| s.items.clone()).unwrap_or_default()
    }

    pub fn has_more_received(&self) -> bool {
        self.received.lock().map(|s| s.has_more).unwrap_or(false)
    }

    pub fn has_more_sent(&self) -> bool {
        self.sent.lock().map(|s| s.has_more).unwrap_or(false)
    }

    #[cfg(test)]
    pub fn is_loading_received(&self) -> bool {
        self.received.lock().map(|s| s.loading).unwrap_or(false)
    }

    // ---- 受信 ----

    /// 受信一覧を同期する。`append` なら続きのページ、そうでなければ先頭から
    pub fn load_received(&self, append: bool, trigger: Trigger) -> LoadOutcome {
        let guard = match begin_load(&self.received, append) {
            Ok(Some(g)) => g,
            Ok(None) => {
                self.debug("sync", "received load skipped (already loading)");
                return LoadOutcome::Skipped;
            }
            Err(e) => return LoadOutcome::Failed(e),
        };

        match self.sync_received(guard.offset) {
            Ok((fetched, new, displayed)) => {
                if let Ok(mut s) = self.received.lock() {
                    s.items = displayed;
                    s.offset = guard.offset + fetched;
                    s.has_more = fetched == self.page_size;
                }
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Info, "received memos synced")
                        .layer("usecase")
                        .kind("sync")
                        .field("fetched", fetched)
                        .field("new", new)
                        .field("offset", guard.offset),
                );
                LoadOutcome::Loaded { fetched, new }
            }
            Err(e) => {
                let level = match trigger {
                    Trigger::User => LogLevel::Error,
                    Trigger::Background => LogLevel::Warn,
                };
                let _ = self.log.log(
                    &LogRecord::new(level, "failed to load received memos")
                        .layer("usecase")
                        .kind("sync")
                        .field("error", e.to_string()),
                );
                if trigger == Trigger::User {
                    self.alert.show(ALERT_ERROR, ALERT_LOAD_FAILED);
                }
                LoadOutcome::Failed(e)
            }
        }
    }

    /// ポーラーからの先頭ページ同期（失敗は通知しない）
    pub fn poll_received(&self) -> LoadOutcome {
        self.load_received(false, Trigger::Background)
    }

    pub fn refresh_received(&self) -> LoadOutcome {
        self.load_received(false, Trigger::User)
    }

    pub fn load_more_received(&self) -> LoadOutcome {
        self.load_received(true, Trigger::User)
    }

    /// 1 ページ分の新着を端末に取り込み、(取得件数, 新着件数, 表示用一覧) を返す
    fn sync_received(&self, offset: usize) -> Result<(usize, usize, Vec<ReceivedMemo>), Error> {
        let server = self.api.received_memos(self.page_size, offset)?;
        let fetched = server.len();

        let known: HashSet<String> = self
            .cached_received()?
            .iter()
            .map(|m| m.id().to_string())
            .collect();
        let deleted = self.deleted_ids()?;

        let mut new = 0;
        for memo in server
            .into_iter()
            .filter(|m| !known.contains(&m.id) && !deleted.contains(&m.id))
        {
            let is_broadcast = memo.is_broadcast;
            let id = memo.id.clone();
            let received = ReceivedMemo::new(memo, self.clock.now_rfc3339());
            if self.cache.add(&received, Some("id"))? {
                new += 1;
            }
            if !is_broadcast {
                self.mark_delivered(&id);
            }
        }

        Ok((fetched, new, self.cached_received()?))
    }

    /// 配信済み通知。失敗してもバッチは止めない
    fn mark_delivered(&self, id: &str) {
        if let Err(e) = self.api.update_status(id, MemoStatus::Delivered) {
            let _ = self.log.log(
                &LogRecord::new(LogLevel::Warn, "failed to mark memo delivered")
                    .layer("usecase")
                    .kind("sync")
                    .field("memo_id", id)
                    .field("error", e.to_string()),
            );
        }
    }

    /// 端末に保存済みの受信メモ。
    ///
    /// キャッシュ TTL を過ぎたもの、メモ自身の ttlDays を過ぎたもの（こちらは書き戻して削除）、
    /// 削除済み ID に含まれるものを除いて返す。
    pub fn cached_received(&self) -> Result<Vec<ReceivedMemo>, Error> {
        let now = i64::try_from(self.clock.now_ms()).unwrap_or(i64::MAX);
        let items = self.cache.get()?;
        if items.iter().any(|m| m.is_expired_at(now)) {
            let removed = self.cache.remove_where(|m| m.is_expired_at(now))?;
            self.debug_count("cache", "expired memos dropped", removed);
        }
        let deleted = self.deleted_ids()?;
        Ok(items
            .into_iter()
            .filter(|m| !m.is_expired_at(now) && !deleted.contains(m.id()))
            .collect())
    }

    pub fn deleted_ids(&self) -> Result<HashSet<String>, Error> {
        Ok(self.deleted.load()?.into_iter().collect())
    }

    /// 受信メモを端末から削除する。
    ///
    /// 墓標を先に書き、次にキャッシュから外す。失敗時は通知し、表示を保存内容から読み直す。
    pub fn delete_received(&self, id: &str) -> Result<DeleteOutcome, Error> {
        let Some(_guard) = self.claim_delete(id)? else {
            self.debug("delete", "delete already in progress");
            return Ok(DeleteOutcome::AlreadyInProgress);
        };

        match self.delete_received_locally(id) {
            Ok(()) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Info, "received memo deleted")
                        .layer("usecase")
                        .kind("delete")
                        .field("memo_id", id),
                );
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.delete_failed(id, &e);
                if let Ok(items) = self.cached_received() {
                    if let Ok(mut s) = self.received.lock() {
                        s.items = items;
                    }
                }
                Err(e)
            }
        }
    }

    fn delete_received_locally(&self, id: &str) -> Result<(), Error> {
        self.deleted.update(|ids| {
            if !ids.iter().any(|d| d == id) {
                ids.push(id.to_string());
            }
        })?;
        self.cache.remove_where(|m| m.id() == id)?;
        lock(&self.received)?.items.retain(|m| m.id() != id);
        let items = self.cached_received()?;
        lock(&self.received)?.items = items;
        Ok(())
    }

    fn claim_delete(&self, id: &str) -> Result<Option<DeleteGuard<'_>>, Error> {
        let mut in_flight = lock(&self.deleting)?;
        if !in_flight.insert(id.to_string()) {
            return Ok(None);
        }
        Ok(Some(DeleteGuard {
            in_flight: &self.deleting,
            id: id.to_string(),
        }))
    }

    /// 端末キャッシュと削除済み ID をすべて消し、受信一覧を初期状態に戻す。
    /// 墓標が消えるのはここだけ。
    pub fn clear_local_cache(&self) -> Result<(), Error> {
        self.cache.clear()?;
        self.deleted.clear()?;
        {
            // loading は進行中の読み込みのガードが持つので触らない
            let mut s = lock(&self.received)?;
            s.items.clear();
            s.offset = 0;
            s.has_more = true;
        }
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "local memo cache cleared")
                .layer("usecase")
                .kind("cache"),
        );
        Ok(())
    }

    // ---- 送信 ----

    pub fn load_sent(&self, append: bool) -> LoadOutcome {
        let guard = match begin_load(&self.sent, append) {
            Ok(Some(g)) => g,
            Ok(None) => {
                self.debug("sync", "sent load skipped (already loading)");
                return LoadOutcome::Skipped;
            }
            Err(e) => return LoadOutcome::Failed(e),
        };

        match self.api.sent_memos(self.page_size, guard.offset) {
            Ok(memos) => {
                let fetched = memos.len();
                if let Ok(mut s) = self.sent.lock() {
                    if append {
                        s.items.extend(memos);
                    } else {
                        s.items = memos;
                    }
                    s.offset = guard.offset + fetched;
                    s.has_more = fetched == self.page_size;
                }
                LoadOutcome::Loaded { fetched, new: 0 }
            }
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Error, "failed to load sent memos")
                        .layer("usecase")
                        .kind("sync")
                        .field("error", e.to_string()),
                );
                LoadOutcome::Failed(e)
            }
        }
    }

    /// 送信メモをサーバーから削除する。成功したときだけ表示から外す
    pub fn delete_sent(&self, id: &str) -> Result<(), Error> {
        match self.api.delete_memo(id) {
            Ok(()) => {
                lock(&self.sent)?.items.retain(|m| m.id != id);
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Info, "sent memo deleted")
                        .layer("usecase")
                        .kind("delete")
                        .field("memo_id", id),
                );
                Ok(())
            }
            Err(e) => {
                self.delete_failed(id, &e);
                Err(e)
            }
        }
    }

    /// メモを送信する。
    ///
    /// 入力不正は Err。送信の成否は通知し、成功なら true（送信一覧を読み直す）、失敗なら false。
    pub fn submit(&self, input: &SubmitMemo) -> Result<bool, Error> {
        let request = input.validate()?;
        match self.api.send_memo(&request) {
            Ok(memo) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Info, "memo sent")
                        .layer("usecase")
                        .kind("send")
                        .field("memo_id", memo.id.as_str())
                        .field("is_broadcast", memo.is_broadcast),
                );
                self.alert.show(ALERT_SUCCESS, ALERT_MEMO_SENT);
                let _ = self.load_sent(false);
                Ok(true)
            }
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Error, "failed to send memo")
                        .layer("usecase")
                        .kind("send")
                        .field("error", e.to_string()),
                );
                self.alert.show(ALERT_ERROR, ALERT_SEND_FAILED);
                Ok(false)
            }
        }
    }

    fn delete_failed(&self, id: &str, e: &Error) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Error, "failed to delete memo")
                .layer("usecase")
                .kind("delete")
                .field("memo_id", id)
                .field("error", e.to_string()),
        );
        self.alert.show(ALERT_ERROR, ALERT_DELETE_FAILED);
    }

    fn debug(&self, kind: &str, message: &str) {
        let _ = self
            .log
            .log(&LogRecord::new(LogLevel::Debug, message).layer("usecase").kind(kind));
    }

    fn debug_count(&self, kind: &str, message: &str, count: usize) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, message)
                .layer("usecase")
                .kind(kind)
                .field("count", count),
        );
    }
}
