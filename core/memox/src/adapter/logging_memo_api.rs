//! MemoApi の各呼び出しをログに記録するラッパ

use crate::domain::{Memo, MemoStatus, SendMemoRequest};
use crate::ports::outbound::MemoApi;
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Arc;

pub struct LoggingMemoApi {
    inner: Arc<dyn MemoApi>,
    log: Arc<dyn Log>,
}

impl LoggingMemoApi {
    pub fn new(inner: Arc<dyn MemoApi>, log: Arc<dyn Log>) -> Self {
        Self { inner, log }
    }

    fn record<T>(&self, operation: &str, result: &Result<T, Error>, extra: LogRecord) -> LogRecord {
        let rec = extra.field("operation", operation);
        match result {
            Ok(_) => rec,
            Err(e) => {
                let mut rec = rec.field("error", e.to_string());
                rec.level = LogLevel::Error;
                rec.message = "memo api request failed".to_string();
                rec
            }
        }
    }

    fn base(message: &str) -> LogRecord {
        LogRecord::new(LogLevel::Info, message)
            .layer("adapter")
            .kind("http")
    }

    fn emit(&self, rec: LogRecord) {
        let _ = self.log.log(&rec);
    }
}

impl MemoApi for LoggingMemoApi {
    fn sent_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        let out = self.inner.sent_memos(limit, offset);
        let mut rec = Self::base("memo api read")
            .field("limit", limit)
            .field("offset", offset);
        if let Ok(memos) = &out {
            rec = rec.field("count", memos.len());
        }
        self.emit(self.record("sent_memos", &out, rec));
        out
    }

    fn received_memos(&self, limit: usize, offset: usize) -> Result<Vec<Memo>, Error> {
        let out = self.inner.received_memos(limit, offset);
        let mut rec = Self::base("memo api read")
            .field("limit", limit)
            .field("offset", offset);
        if let Ok(memos) = &out {
            rec = rec.field("count", memos.len());
        }
        self.emit(self.record("received_memos", &out, rec));
        out
    }

    fn send_memo(&self, request: &SendMemoRequest) -> Result<Memo, Error> {
        let out = self.inner.send_memo(request);
        let mut rec = Self::base("memo api write").field("is_broadcast", request.is_broadcast);
        if let Ok(memo) = &out {
            rec = rec.field("memo_id", memo.id.as_str());
        }
        self.emit(self.record("send_memo", &out, rec));
        out
    }

    fn update_status(&self, id: &str, status: MemoStatus) -> Result<(), Error> {
        let out = self.inner.update_status(id, status);
        let rec = Self::base("memo api write")
            .field("memo_id", id)
            .field("status", status.as_str());
        self.emit(self.record("update_status", &out, rec));
        out
    }

    fn delete_memo(&self, id: &str) -> Result<(), Error> {
        let out = self.inner.delete_memo(id);
        let rec = Self::base("memo api write").field("memo_id", id);
        self.emit(self.record("delete_memo", &out, rec));
        out
    }

    fn users(&self) -> Result<Vec<String>, Error> {
        let out = self.inner.users();
        let mut rec = Self::base("memo api read");
        if let Ok(users) = &out {
            rec = rec.field("count", users.len());
        }
        self.emit(self.record("users", &out, rec));
        out
    }
}
