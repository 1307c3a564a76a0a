//! 受信メモのバックグラウンドポーリング
//!
//! 専用スレッドで一定間隔ごとに先頭ページを同期する。失敗はログのみ。
//! 手動の更新と同じ読み込み中フラグを通るので、重なった回は捨てられる。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use common::ports::outbound::{Log, LogLevel, LogRecord};

use crate::usecase::memo_repository::{LoadOutcome, MemoRepository};

/// 停止フラグを見る間隔（これより長く止まらない）
const STOP_CHECK: Duration = Duration::from_millis(50);

pub struct Poller;

impl Poller {
    /// ポーリングスレッドを起動する。`stop` が立つと次の確認で抜ける。
    /// 最初の同期は `interval` 経過後。
    pub fn spawn(
        repo: Arc<MemoRepository>,
        interval: Duration,
        stop: Arc<AtomicBool>,
        log: Arc<dyn Log>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let _ = log.log(
                &LogRecord::new(LogLevel::Info, "poller started")
                    .layer("usecase")
                    .kind("lifecycle")
                    .field("interval_ms", interval.as_millis() as u64),
            );
            while wait(interval, &stop) {
                Self::tick(&repo);
            }
            let _ = log.log(
                &LogRecord::new(LogLevel::Info, "poller stopped")
                    .layer("usecase")
                    .kind("lifecycle"),
            );
        })
    }

    /// 1 回分の同期
    pub fn tick(repo: &MemoRepository) -> LoadOutcome {
        repo.poll_received()
    }
}

/// `interval` 待つ。途中で停止したら false
fn wait(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(STOP_CHECK.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_returns_false_when_stopped() {
        let stop = AtomicBool::new(true);
        assert!(!wait(Duration::from_secs(60), &stop));
    }

    #[test]
    fn test_wait_elapses() {
        let stop = AtomicBool::new(false);
        assert!(wait(Duration::from_millis(1), &stop));
    }
}
