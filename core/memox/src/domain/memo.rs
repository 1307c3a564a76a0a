//! メモのドメイン型
//!
//! サーバーが返す JSON（camelCase）と同じ形でシリアライズする。

use serde::{Deserialize, Serialize};

/// 配信状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoStatus {
    /// 送信済み・未配信
    #[default]
    Sent,
    /// 受信者の端末に届いた
    Delivered,
}

impl MemoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }
}

/// 全員宛てメモの宛先表記
pub const BROADCAST_RECIPIENT: &str = "broadcast";

/// サーバー所有のメモ。送信時に作られ、以後変わるのは status のみ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub is_broadcast: bool,
    /// 表示期限（日）。None は無期限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_days: Option<i64>,
    pub created_at: String,
    #[serde(default)]
    pub status: MemoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
}

/// 端末に保存した受信メモ（保存時刻付きのクライアント側コピー）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMemo {
    #[serde(flatten)]
    pub memo: Memo,
    pub saved_at: String,
}

impl ReceivedMemo {
    pub fn new(memo: Memo, saved_at: impl Into<String>) -> Self {
        Self {
            memo,
            saved_at: saved_at.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.memo.id
    }
}

/// POST /memos の本文
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMemoRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
    pub is_broadcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_days: Option<i64>,
}

impl SendMemoRequest {
    /// 宛先を決めてリクエストを作る（全員宛てなら宛先は "broadcast"）
    pub fn new(
        to: &str,
        subject: &str,
        message: &str,
        is_broadcast: bool,
        ttl_days: Option<i64>,
    ) -> Self {
        Self {
            to: if is_broadcast {
                BROADCAST_RECIPIENT.to_string()
            } else {
                to.trim().to_string()
            },
            subject: subject.to_string(),
            message: message.to_string(),
            is_broadcast,
            ttl_days,
        }
    }
}

/// 一覧の種別（受信 / 送信）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    Received,
    Sent,
}
