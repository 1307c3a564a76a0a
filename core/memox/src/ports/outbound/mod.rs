//! Outbound ポート: アプリが外界（REST バックエンド）を使うための trait

pub mod memo_api;

pub use memo_api::MemoApi;
