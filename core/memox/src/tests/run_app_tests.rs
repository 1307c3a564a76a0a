//! Runner を配線済みの App（フェイクのポート）で動かす

use std::sync::Arc;

use common::adapter::{
    ManualClock, MemoryKeyValueStore, MemoryLog, RecordingAlert, RecordingSleeper,
    StaticTokenProvider,
};
use common::auth::TokenSource;
use common::retry::RetryPolicy;

use super::fakes::{memo, FakeMemoApi, NOW_MS};
use crate::adapter::AppConfig;
use crate::domain::{Command, MemoFilter, MemoKind};
use crate::ports::inbound::UseCaseRunner;
use crate::wiring::{assemble, Ports};
use crate::Runner;

struct Fixture {
    api: Arc<FakeMemoApi>,
    alert: Arc<RecordingAlert>,
    log: Arc<MemoryLog>,
    runner: Runner,
}

fn fixture(api: FakeMemoApi) -> Fixture {
    let api = Arc::new(api);
    let alert = Arc::new(RecordingAlert::new());
    let log = Arc::new(MemoryLog::new());
    let sleeper = Arc::new(RecordingSleeper::new());
    let tokens = Arc::new(TokenSource::new(
        Arc::new(StaticTokenProvider::dev()),
        sleeper.clone(),
        RetryPolicy::token(),
        log.clone(),
    ));
    let app = assemble(
        Ports {
            api: api.clone(),
            store: Arc::new(MemoryKeyValueStore::new()),
            clock: Arc::new(ManualClock::new(NOW_MS)),
            sleeper,
            alert: alert.clone(),
            logger: log.clone(),
            tokens,
        },
        AppConfig::default(),
    );
    Fixture {
        api,
        alert,
        log,
        runner: Runner { app },
    }
}

fn received() -> Command {
    Command::Received {
        more: false,
        filter: MemoFilter::default(),
    }
}

#[test]
fn test_help_exits_zero_and_logs_lifecycle() {
    let f = fixture(FakeMemoApi::new());
    assert_eq!(f.runner.run(Command::Help).unwrap(), 0);

    let messages: Vec<String> = f
        .log
        .of_kind("lifecycle")
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(messages, vec!["command started", "command finished"]);
}

#[test]
fn test_received_syncs_into_repository() {
    let f = fixture(FakeMemoApi::with_received(vec![memo("m1"), memo("m2")]));
    assert_eq!(f.runner.run(received()).unwrap(), 0);
    assert_eq!(f.runner.app.repo.received().len(), 2);
    assert_eq!(f.api.status_updates().len(), 2);
}

#[test]
fn test_received_offline_falls_back_to_cache_with_error_code() {
    let f = fixture(FakeMemoApi::with_received(vec![memo("m1")]));
    f.runner.run(received()).unwrap();
    f.api.fail_received(true);

    assert_eq!(f.runner.run(received()).unwrap(), 74);
    assert_eq!(f.runner.app.repo.cached_received().unwrap().len(), 1);
    assert_eq!(f.alert.shown().len(), 1);
}

#[test]
fn test_send_failure_exits_one() {
    let f = fixture(FakeMemoApi::new());
    f.api.fail_send(true);
    let code = f
        .runner
        .run(Command::Send {
            to: Some("bob@example.com".to_string()),
            subject: "Hi".to_string(),
            message: "Lunch?".to_string(),
            broadcast: false,
            ttl_days: None,
        })
        .unwrap();
    assert_eq!(code, 1);
}

#[test]
fn test_send_without_recipient_is_usage_error() {
    let f = fixture(FakeMemoApi::new());
    let err = f
        .runner
        .run(Command::Send {
            to: None,
            subject: "Hi".to_string(),
            message: "Lunch?".to_string(),
            broadcast: false,
            ttl_days: None,
        })
        .unwrap_err();
    assert!(err.is_usage());
    assert!(f.api.send_requests().is_empty());
    assert_eq!(f.log.of_kind("error").len(), 1);
}

#[test]
fn test_favorite_toggles() {
    let f = fixture(FakeMemoApi::new());
    let fav = || Command::Favorite {
        id: "m1".to_string(),
    };
    f.runner.run(fav()).unwrap();
    assert!(f.runner.app.favorites.load().unwrap().contains("m1"));
    f.runner.run(fav()).unwrap();
    assert!(!f.runner.app.favorites.load().unwrap().contains("m1"));
}

#[test]
fn test_archive_then_unarchive() {
    let f = fixture(FakeMemoApi::with_received(vec![memo("m1")]));
    f.runner.run(received()).unwrap();

    let archive = Command::Archive {
        id: "m1".to_string(),
        kind: MemoKind::Received,
    };
    assert_eq!(f.runner.run(archive).unwrap(), 0);
    assert!(f.runner.app.repo.received().is_empty());
    assert_eq!(f.runner.app.archive.list().unwrap().len(), 1);

    let unarchive = || Command::Unarchive {
        id: "m1".to_string(),
    };
    assert_eq!(f.runner.run(unarchive()).unwrap(), 0);
    assert_eq!(f.runner.run(unarchive()).unwrap_err().exit_code(), 64);
}

#[test]
fn test_archive_unknown_memo_is_usage_error() {
    let f = fixture(FakeMemoApi::new());
    let err = f
        .runner
        .run(Command::Archive {
            id: "nope".to_string(),
            kind: MemoKind::Sent,
        })
        .unwrap_err();
    assert_eq!(err.exit_code(), 64);
    assert_eq!(f.api.sent_calls(), 1);
}

#[test]
fn test_clear_cache_forgets_received_memos() {
    let f = fixture(FakeMemoApi::with_received(vec![memo("m1")]));
    f.runner.run(received()).unwrap();
    f.runner
        .run(Command::DeleteReceived {
            id: "m1".to_string(),
        })
        .unwrap();

    assert_eq!(f.runner.run(Command::ClearCache).unwrap(), 0);
    assert!(f.runner.app.repo.cached_received().unwrap().is_empty());
    // 墓標も消えるので次の同期で戻ってくる
    f.runner.run(received()).unwrap();
    assert_eq!(f.runner.app.repo.received().len(), 1);
}

#[test]
fn test_users_and_whoami_exit_zero() {
    let f = fixture(FakeMemoApi::new());
    f.api.push_users(Ok(vec!["a@example.com".to_string()]));
    assert_eq!(f.runner.run(Command::Users).unwrap(), 0);
    assert_eq!(f.runner.run(Command::WhoAmI).unwrap(), 0);
}
