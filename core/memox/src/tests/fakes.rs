//! テスト用のフェイク MemoApi と、それを使って repository を組み立てるハーネス

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use common::adapter::{ManualClock, MemoryKeyValueStore, MemoryLog, RecordingAlert, RecordingSleeper};
use common::error::Error;
use common::list_store::ListStore;
use common::ports::outbound::KeyValueStore;
use common::ttl_store::TtlStore;

use crate::domain::{Memo, MemoStatus, SendMemoRequest};
use crate::ports::outbound::MemoApi;
use crate::usecase::memo_repository::{DELETED_IDS_KEY, RECEIVED_MEMOS_KEY};
use crate::usecase::MemoRepository;

/// 2026-10-16T00:00:00Z
pub const NOW_MS: u64 = 1_792_108_800_000;
pub const NOW: &str = "2026-10-16T00:00:00Z";
pub const DAY_MS: u64 = 86_400_000;

pub fn memo(id: &str) -> Memo {
    Memo {
        id: id.to_string(),
        from: "alice@example.com".to_string(),
        to: "bob@example.com".to_string(),
        subject: format!("subject {}", id),
        message: format!("message {}", id),
        is_broadcast: false,
        ttl_days: None,
        created_at: "2026-10-15T09:00:00Z".to_string(),
        status: MemoStatus::Sent,
        delivered_at: None,
    }
}

pub fn broadcast(id: &str) -> Memo {
    Memo {
        to: "broadcast".to_string(),
        is_broadcast: true,
        ..memo(id)
    }
}

/// サーバーの受信・送信一覧を持ち、呼び出しを記録するフェイク
#[derive(Default)]
pub struct FakeMemoApi {
    received: Mutex<Vec<Memo>>,
    sent: Mutex<Vec<Memo>>,
    users: Mutex<VecDeque<Result<Vec<String>, Error>>>,
    fail_received: AtomicBool,
    fail_sent: AtomicBool,
    fail_send: AtomicBool,
    fail_delete: AtomicBool,
    fail_status_for: Mutex<HashSet<String>>,
    received_calls: AtomicUsize,
    sent_calls: AtomicUsize,
    users_calls: AtomicUsize,
    status_updates: Mutex<Vec<(String, MemoStatus)>>,
    deleted: Mutex<Vec<String>>,
    send_requests: Mutex<Vec<SendMemoRequest>>,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl FakeMemoApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_received(memos: Vec<Memo>) -> Self {
        let api = Self::new();
        api.set_received(memos);
        api
    }

    pub fn set_received(&self, memos: Vec<Memo>) {
        *self.received.lock().unwrap() = memos;
    }

    pub fn set_sent(&self, memos: Vec<Memo>) {
        *self.sent.lock().unwrap() = memos;
    }

    /// users() が返す結果を順に積む（尽きたら空の一覧）
    pub fn push_users(&self, result: Result<Vec<String>, Error>) {
        self.users.lock().unwrap().push_back(result);
    }

    pub fn fail_received(&self, fail: bool) {
        self.fail_received.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sent(&self, fail: bool) {
        self.fail_sent.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status_for(&self, id: &str) {
        self.fail_status_for.lock().unwrap().insert(id.to_string());
    }

    pub fn received_calls(&self) -> usize {
        self.received_calls.load(Ordering::SeqCst)
    }

    pub fn sent_calls(&self) -> usize {
        self.sent_calls.load(Ordering::SeqCst)
    }

    pub fn users_calls(&self) -> usize {
        self.users_calls.load(Ordering::SeqCst)
    }

    pub fn status_updates(&self) -> Vec<(String, MemoStatus)> {
        self.status_updates.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn send_requests(&self) -> Vec<SendMemoRequest> {
        self.send_requests.lock().unwrap().clone()
    }

    /// 次の received_memos を止める。
    /// 返り値の 1 つ目で「呼び出しに入った」ことを待ち、2 つ目に送ると続行する。
    pub fn gate_received(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }
}

fn page(memos: &[Memo], limit: usize, offset: usize) -> Vec<Memo> {
    memos.iter().skip(offset).take(limit).cloned().collect()
}

impl MemoApi for FakeMemoApi {
    fn sent_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        self.sent_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sent.load(Ordering::SeqCst) {
            return Err(Error::http("HTTP 500 Internal Server Error: boom"));
        }
        Ok(page(&self.sent.lock().unwrap(), limit, offset))
    }

    fn received_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        self.received_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        if self.fail_received.load(Ordering::SeqCst) {
            return Err(Error::http("HTTP request failed: connection refused"));
        }
        Ok(page(&self.received.lock().unwrap(), limit, offset))
    }

    fn send_memo(&self, request: &SendMemoRequest) -> Result<Memo, Error> {
        self.send_requests.lock().unwrap().push(request.clone());
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Error::http("HTTP 400 Bad Request: invalid recipient"));
        }
        let created = Memo {
            id: format!("new-{}", self.send_requests.lock().unwrap().len()),
            from: "me@example.com".to_string(),
            to: request.to.clone(),
            subject: request.subject.clone(),
            message: request.message.clone(),
            is_broadcast: request.is_broadcast,
            ttl_days: request.ttl_days,
            created_at: NOW.to_string(),
            status: MemoStatus::Sent,
            delivered_at: None,
        };
        self.sent.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    fn update_status(&self, id: &str, status: MemoStatus) -> Result<(), Error> {
        self.status_updates
            .lock()
            .unwrap()
            .push((id.to_string(), status));
        if self.fail_status_for.lock().unwrap().contains(id) {
            return Err(Error::http("HTTP 404 Not Found: memo not found"));
        }
        Ok(())
    }

    fn delete_memo(&self, id: &str) -> Result<(), Error> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::http("HTTP 403 Forbidden: not the sender"));
        }
        self.deleted.lock().unwrap().push(id.to_string());
        self.sent.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    fn users(&self) -> Result<Vec<String>, Error> {
        self.users_calls.fetch_add(1, Ordering::SeqCst);
        self.users.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }
}

/// 書き込みを失敗させられる KeyValueStore（読み取りは内側へ委譲）
pub struct FlakyStore {
    pub inner: MemoryKeyValueStore,
    pub fail_writes_for: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            fail_writes_for: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_writes(&self, key: &str) {
        self.fail_writes_for.lock().unwrap().insert(key.to_string());
    }

    fn check(&self, key: &str) -> Result<(), Error> {
        if self.fail_writes_for.lock().unwrap().contains(key) {
            return Err(Error::io_msg(format!("disk full writing {}", key)));
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

/// repository とフェイク群
pub struct Harness {
    pub api: Arc<FakeMemoApi>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<ManualClock>,
    pub alert: Arc<RecordingAlert>,
    pub log: Arc<MemoryLog>,
    pub sleeper: Arc<RecordingSleeper>,
    pub repo: Arc<MemoRepository>,
}

impl Harness {
    pub fn new(api: FakeMemoApi, page_size: usize) -> Self {
        Self::with_store(api, Arc::new(MemoryKeyValueStore::new()), page_size)
    }

    pub fn with_store(api: FakeMemoApi, store: Arc<dyn KeyValueStore>, page_size: usize) -> Self {
        let api = Arc::new(api);
        let clock = Arc::new(ManualClock::new(NOW_MS));
        let alert = Arc::new(RecordingAlert::new());
        let log = Arc::new(MemoryLog::new());
        let repo = Arc::new(MemoRepository::new(
            api.clone(),
            TtlStore::new(store.clone(), RECEIVED_MEMOS_KEY, 30, clock.clone(), log.clone()),
            ListStore::new(store.clone(), DELETED_IDS_KEY, log.clone()),
            clock.clone(),
            alert.clone(),
            log.clone(),
            page_size,
        ));
        Self {
            api,
            store,
            clock,
            alert,
            log,
            sleeper: Arc::new(RecordingSleeper::new()),
            repo,
        }
    }

    pub fn received_ids(&self) -> Vec<String> {
        self.repo
            .received()
            .iter()
            .map(|m| m.id().to_string())
            .collect()
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.repo.sent().iter().map(|m| m.id.clone()).collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        ListStore::<String>::new(self.store.clone(), DELETED_IDS_KEY, self.log.clone())
            .load()
            .unwrap()
    }
}
