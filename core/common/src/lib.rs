//! MemoX 共通ライブラリ
//!
//! エラー型・Outbound ポート・標準アダプタと、
//! KeyValueStore 上の永続コレクション（TTL 付き / 期限なし）を提供します。

/// エラーハンドリング
pub mod error;

pub mod domain;

/// Ports & Adapters
pub mod ports;
pub mod adapter;

/// TTL 付き永続コレクション
pub mod ttl_store;

/// 期限なし永続リスト
pub mod list_store;

/// リトライポリシー
pub mod retry;

/// 認証トークン取得と JWT クレーム
pub mod auth;
