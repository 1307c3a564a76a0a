//! memox コマンドの enum（Command Pattern）
//!
//! 引数解析の結果を enum に落とし、main の match でディスパッチする。

use super::filter::MemoFilter;
use super::memo::MemoKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// ヘルプ表示
    Help,

    /// 受信一覧を同期して表示（--more で次のページ）
    Received { more: bool, filter: MemoFilter },
    /// 送信一覧を表示（--more で次のページ）
    Sent { more: bool, filter: MemoFilter },

    /// メモ送信
    Send {
        to: Option<String>,
        subject: String,
        message: String,
        broadcast: bool,
        ttl_days: Option<i64>,
    },

    /// 受信メモを端末から削除（再同期でも復活しない）
    DeleteReceived { id: String },
    /// 送信メモをサーバーから削除
    DeleteSent { id: String },

    /// お気に入りの切り替え
    Favorite { id: String },
    /// お気に入り一覧
    Favorites { filter: MemoFilter },

    /// アーカイブへ移動
    Archive { id: String, kind: MemoKind },
    /// アーカイブ一覧
    Archived { filter: MemoFilter },
    /// アーカイブから完全に削除
    Unarchive { id: String },

    /// 既知ユーザー一覧
    Users,
    /// 端末キャッシュ（受信メモ・削除済み ID）を消す
    ClearCache,
    /// 受信メモを一定間隔でポーリングし続ける
    Watch,
    /// トークンから読んだユーザー
    WhoAmI,
}
