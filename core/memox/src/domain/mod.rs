//! ドメイン（メモ・期限判定・絞り込み・コマンド）

pub mod command;
pub mod expiry;
pub mod filter;
pub mod memo;

pub use command::Command;
pub use filter::{parse_date, Filterable, MemoFilter};
pub use memo::{Memo, MemoKind, MemoStatus, ReceivedMemo, SendMemoRequest};
