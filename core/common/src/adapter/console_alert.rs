//! stderr にアラートを出す Alert 実装と、テスト用の記録実装

use crate::ports::outbound::Alert;
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct ConsoleAlert;

impl Alert for ConsoleAlert {
    fn show(&self, title: &str, message: &str) {
        eprintln!("[{}] {}", title, message);
    }
}

/// 表示されたアラートを (title, message) で記録する Alert 実装（テスト用）
#[derive(Debug, Default)]
pub struct RecordingAlert {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Alert for RecordingAlert {
    fn show(&self, title: &str, message: &str) {
        if let Ok(mut v) = self.shown.lock() {
            v.push((title.to_string(), message.to_string()));
        }
    }
}
