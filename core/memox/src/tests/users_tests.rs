use std::time::Duration;

use common::error::Error;

use super::fakes::{FakeMemoApi, Harness};
use crate::usecase::KnownUsers;

fn known_users(h: &Harness) -> KnownUsers {
    KnownUsers::new(h.api.clone(), h.sleeper.clone(), h.log.clone())
}

#[test]
fn test_first_non_empty_answer_wins() {
    let h = Harness::new(FakeMemoApi::new(), 10);
    h.api.push_users(Ok(vec!["a@example.com".to_string(), "b@example.com".to_string()]));

    assert_eq!(known_users(&h).load(), vec!["a@example.com", "b@example.com"]);
    assert_eq!(h.api.users_calls(), 1);
    assert!(h.sleeper.slept().is_empty());
}

#[test]
fn test_retries_on_error_and_empty_list() {
    let h = Harness::new(FakeMemoApi::new(), 10);
    h.api.push_users(Err(Error::http("HTTP request failed: timeout")));
    h.api.push_users(Ok(Vec::new()));
    h.api.push_users(Ok(vec!["a@example.com".to_string()]));

    assert_eq!(known_users(&h).load(), vec!["a@example.com"]);
    assert_eq!(h.api.users_calls(), 3);
    assert_eq!(h.sleeper.slept(), vec![Duration::from_secs(1); 2]);
}

#[test]
fn test_gives_up_after_three_retries() {
    let h = Harness::new(FakeMemoApi::new(), 10);

    assert!(known_users(&h).load().is_empty());
    assert_eq!(h.api.users_calls(), 4);
    assert_eq!(h.sleeper.slept().len(), 3);
    assert!(h
        .log
        .of_kind("users")
        .iter()
        .any(|r| r.message == "known users unavailable"));
}
