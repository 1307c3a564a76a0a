//! お気に入り・アーカイブ（端末だけに保存する補助テーブル）
//!
//! どちらも期限なしで、変更のたびに全体を書き戻す。

use std::collections::HashSet;
use std::sync::Arc;

use common::error::Error;
use common::list_store::ListStore;
use common::ports::outbound::{Clock, Log, LogLevel, LogRecord};

use crate::domain::{Filterable, Memo, MemoKind, ReceivedMemo};
use crate::usecase::memo_repository::{DeleteOutcome, MemoRepository};

pub const FAVORITES_KEY: &str = "memox:favorites";
pub const ARCHIVE_KEY: &str = "memox:archive";

/// お気に入りのメモ ID 集合
pub struct Favorites {
    store: ListStore<String>,
}

impl Favorites {
    pub fn new(store: ListStore<String>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<HashSet<String>, Error> {
        Ok(self.store.load()?.into_iter().collect())
    }

    /// 付け外しを切り替える。付いた状態になったら true
    pub fn toggle(&self, id: &str) -> Result<bool, Error> {
        self.store.update(|ids| {
            if let Some(pos) = ids.iter().position(|f| f == id) {
                ids.remove(pos);
                false
            } else {
                ids.push(id.to_string());
                true
            }
        })
    }
}

/// アーカイブ（新しいものが先頭）
pub struct Archive {
    store: ListStore<ReceivedMemo>,
}

impl Archive {
    pub fn new(store: ListStore<ReceivedMemo>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<ReceivedMemo>, Error> {
        self.store.load()
    }

    /// 先頭に入れる。同じ ID があれば置き換え、1 件だけ残す
    pub fn archive(&self, memo: ReceivedMemo) -> Result<(), Error> {
        self.store.update(|items| {
            items.retain(|m| m.id() != memo.id());
            items.insert(0, memo);
        })
    }

    /// アーカイブから完全に削除する。見つかれば true
    pub fn remove(&self, id: &str) -> Result<bool, Error> {
        self.store.update(|items| {
            let before = items.len();
            items.retain(|m| m.id() != id);
            items.len() != before
        })
    }
}

/// 一覧からアーカイブへ移すユースケース
pub struct ArchiveUseCase {
    repo: Arc<MemoRepository>,
    archive: Arc<Archive>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
}

impl ArchiveUseCase {
    pub fn new(
        repo: Arc<MemoRepository>,
        archive: Arc<Archive>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            repo,
            archive,
            clock,
            log,
        }
    }

    pub fn archive(&self, id: &str, kind: MemoKind) -> Result<bool, Error> {
        match kind {
            MemoKind::Received => self.archive_received(id),
            MemoKind::Sent => self.archive_sent(id),
        }
    }

    /// 受信メモを写してアーカイブし、受信一覧から削除（墓標付き）して読み直す。
    /// 見つからなければ何もせず false。
    pub fn archive_received(&self, id: &str) -> Result<bool, Error> {
        let found = match self.repo.received().into_iter().find(|m| m.id() == id) {
            Some(m) => Some(m),
            None => self.repo.cached_received()?.into_iter().find(|m| m.id() == id),
        };
        let Some(memo) = found else {
            return Ok(false);
        };
        self.archive.archive(memo)?;
        if self.repo.delete_received(id)? == DeleteOutcome::AlreadyInProgress {
            return Ok(true);
        }
        self.logged("received", id);
        let _ = self.repo.refresh_received();
        Ok(true)
    }

    /// 送信メモを savedAt 付きで写してアーカイブし、サーバーから削除する。
    /// 表示中の送信一覧に無ければ何もせず false。
    pub fn archive_sent(&self, id: &str) -> Result<bool, Error> {
        let Some(memo) = self.repo.sent().into_iter().find(|m| m.id == id) else {
            return Ok(false);
        };
        self.archive
            .archive(ReceivedMemo::new(memo, self.clock.now_rfc3339()))?;
        self.repo.delete_sent(id)?;
        self.logged("sent", id);
        Ok(true)
    }

    fn logged(&self, kind: &str, id: &str) {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "memo archived")
                .layer("usecase")
                .kind("archive")
                .field("memo_id", id)
                .field("from_list", kind),
        );
    }
}

/// お気に入りビューの 1 行
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteMemo {
    Received(ReceivedMemo),
    Sent(Memo),
}

impl FavoriteMemo {
    fn inner(&self) -> &dyn Filterable {
        match self {
            Self::Received(m) => m,
            Self::Sent(m) => m,
        }
    }
}

impl Filterable for FavoriteMemo {
    fn subject(&self) -> &str {
        self.inner().subject()
    }
    fn message(&self) -> &str {
        self.inner().message()
    }
    fn from(&self) -> &str {
        self.inner().from()
    }
    fn to(&self) -> &str {
        self.inner().to()
    }
    fn display_date(&self) -> &str {
        self.inner().display_date()
    }
    fn is_broadcast(&self) -> bool {
        self.inner().is_broadcast()
    }
    fn id(&self) -> &str {
        self.inner().id()
    }
}

/// 受信・送信の両方からお気に入りを集める（受信が先、同じ ID は 1 回だけ）
pub fn favorite_memos(
    received: &[ReceivedMemo],
    sent: &[Memo],
    favorites: &HashSet<String>,
) -> Vec<FavoriteMemo> {
    let mut seen = HashSet::new();
    let received = received
        .iter()
        .filter(|m| favorites.contains(m.id()))
        .map(|m| FavoriteMemo::Received(m.clone()));
    let sent = sent
        .iter()
        .filter(|m| favorites.contains(&m.id))
        .map(|m| FavoriteMemo::Sent(m.clone()));
    received
        .chain(sent)
        .filter(|m| seen.insert(m.id().to_string()))
        .collect()
}
