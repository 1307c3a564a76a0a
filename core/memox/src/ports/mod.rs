//! Ports & Adapters のポート定義
//!
//! - inbound: CLI から UseCase を呼ぶ入口
//! - outbound: REST バックエンドなど外界に依頼するための trait

pub mod inbound;
pub mod outbound;
