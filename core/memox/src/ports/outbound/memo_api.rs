//! メモ REST バックエンドの Outbound ポート
//!
//! すべて bearer トークン付きで呼ばれる。ページングは limit / offset で、
//! 返ってきた件数が limit と等しいことだけを「続きがある」合図とする。

use crate::domain::{Memo, MemoStatus, SendMemoRequest};
use common::error::Error;

pub trait MemoApi: Send + Sync {
    /// GET /memos/sent?limit&offset
    fn sent_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error>;
    /// GET /memos/received?limit&offset（直接宛て + 全員宛て）
    fn received_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error>;
    /// POST /memos
    fn send_memo(&self, request: &SendMemoRequest) -> Result<Memo, Error>;
    /// PUT /memos/:id/status
    fn update_status(&self, id: &str, status: MemoStatus) -> Result<(), Error>;
    /// DELETE /memos/:id
    fn delete_memo(&self, id: &str) -> Result<(), Error>;
    /// GET /users（有効ユーザーの e-mail 一覧）
    fn users(&self) -> Result<Vec<String>, Error>;
}
