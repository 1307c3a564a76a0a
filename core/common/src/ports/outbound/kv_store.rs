//! キー・バリューストア Outbound ポート
//!
//! ネイティブ側のローカルストレージ（requestGetLocalData / requestSaveLocalData）を
//! 文字列キー・文字列値の get / set として扱う。キー空間は 1 つで、複数キー間の原子性はない。

use crate::error::Error;

/// キー・バリューストア抽象（Outbound ポート）
///
/// 実装は `MemoryKeyValueStore`（テスト・フォールバック用）、`FileKeyValueStore`、
/// それらを束ねる `BridgeKeyValueStore` など。
pub trait KeyValueStore: Send + Sync {
    /// 値を取得する。未保存なら `Ok(None)`
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    /// キーを削除する（存在しなければ何もしない）
    fn remove(&self, key: &str) -> Result<(), Error>;
}
