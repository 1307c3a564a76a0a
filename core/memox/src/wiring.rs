//! 配線: 標準アダプタで UseCase を組み立てる

use std::sync::Arc;

use common::adapter::{
    BridgeKeyValueStore, ConsoleAlert, FileJsonLog, FileKeyValueStore, FileTokenProvider,
    MemoryKeyValueStore, StaticTokenProvider, StdClock, StdEnvResolver, StdFileSystem, StdSleeper,
};
use common::auth::TokenSource;
use common::domain::Dirs;
use common::error::Error;
use common::list_store::ListStore;
use common::ports::outbound::{
    Alert, Clock, EnvResolver, FileSystem, KeyValueStore, Log, LogLevel, LogRecord, Sleeper,
    TokenProvider,
};
use common::retry::RetryPolicy;
use common::ttl_store::TtlStore;

use crate::adapter::{load_config, AppConfig, HttpMemoApi, LoggingMemoApi};
use crate::ports::outbound::MemoApi;
use crate::usecase::memo_repository::{DELETED_IDS_KEY, RECEIVED_MEMOS_KEY};
use crate::usecase::side_tables::{ARCHIVE_KEY, FAVORITES_KEY};
use crate::usecase::{Archive, ArchiveUseCase, Favorites, KnownUsers, MemoRepository};

/// 配線で組み立てたユースケース群（main の Command ディスパッチで利用）
pub struct App {
    pub config: AppConfig,
    pub repo: Arc<MemoRepository>,
    pub favorites: Favorites,
    pub archive: Arc<Archive>,
    pub archive_use_case: ArchiveUseCase,
    pub users: KnownUsers,
    pub tokens: Arc<TokenSource>,
    /// 構造化ログ（ファイルへ JSONL）。ユーザー向けのアラートとは別
    pub logger: Arc<dyn Log>,
}

/// 外側から差し込むポート（本番は wire_memox、テストはフェイク）
pub struct Ports {
    pub api: Arc<dyn MemoApi>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub sleeper: Arc<dyn Sleeper>,
    pub alert: Arc<dyn Alert>,
    pub logger: Arc<dyn Log>,
    pub tokens: Arc<TokenSource>,
}

/// ポートから App を組み立てる
pub fn assemble(ports: Ports, config: AppConfig) -> App {
    let Ports {
        api,
        store,
        clock,
        sleeper,
        alert,
        logger,
        tokens,
    } = ports;

    let cache = TtlStore::new(
        Arc::clone(&store),
        RECEIVED_MEMOS_KEY,
        config.cache_ttl_days,
        Arc::clone(&clock),
        Arc::clone(&logger),
    );
    let deleted = ListStore::new(Arc::clone(&store), DELETED_IDS_KEY, Arc::clone(&logger));
    let repo = Arc::new(MemoRepository::new(
        Arc::clone(&api),
        cache,
        deleted,
        Arc::clone(&clock),
        alert,
        Arc::clone(&logger),
        config.page_size,
    ));
    let favorites = Favorites::new(ListStore::new(
        Arc::clone(&store),
        FAVORITES_KEY,
        Arc::clone(&logger),
    ));
    let archive = Arc::new(Archive::new(ListStore::new(
        Arc::clone(&store),
        ARCHIVE_KEY,
        Arc::clone(&logger),
    )));
    let archive_use_case = ArchiveUseCase::new(
        Arc::clone(&repo),
        Arc::clone(&archive),
        clock,
        Arc::clone(&logger),
    );
    let users = KnownUsers::new(api, sleeper, Arc::clone(&logger));

    App {
        config,
        repo,
        favorites,
        archive,
        archive_use_case,
        users,
        tokens,
        logger,
    }
}

/// 配線: 標準アダプタで App を組み立てる
///
/// `home_dir` は CLI の --home-dir（MEMOX_HOME より優先）。
pub fn wire_memox(home_dir: Option<&str>) -> Result<App, Error> {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let env_resolver: Arc<dyn EnvResolver> = Arc::new(StdEnvResolver);
    let dirs = env_resolver.resolve_dirs(home_dir)?;
    let logger: Arc<dyn Log> = Arc::new(FileJsonLog::new(Arc::clone(&fs), dirs.log_file_path()));
    let config = load_config(fs.as_ref(), env_resolver.as_ref(), &dirs)?;

    let clock: Arc<dyn Clock> = Arc::new(StdClock);
    let sleeper: Arc<dyn Sleeper> = Arc::new(StdSleeper);
    let store = wire_store(Arc::clone(&fs), &dirs, Arc::clone(&logger));

    let provider: Arc<dyn TokenProvider> = match &config.token_file {
        Some(path) => Arc::new(FileTokenProvider::new(Arc::clone(&fs), path.clone())),
        None => {
            let _ = logger.log(
                &LogRecord::new(LogLevel::Warn, "no token file configured, using development token")
                    .layer("wiring")
                    .kind("auth"),
            );
            Arc::new(StaticTokenProvider::dev())
        }
    };
    let tokens = Arc::new(TokenSource::new(
        provider,
        Arc::clone(&sleeper),
        RetryPolicy::token(),
        Arc::clone(&logger),
    ));

    let http: Arc<dyn MemoApi> = Arc::new(HttpMemoApi::new(&config.api_url, Arc::clone(&tokens))?);
    let api: Arc<dyn MemoApi> = Arc::new(LoggingMemoApi::new(http, Arc::clone(&logger)));

    Ok(assemble(
        Ports {
            api,
            store,
            clock,
            sleeper,
            alert: Arc::new(ConsoleAlert),
            logger,
            tokens,
        },
        config,
    ))
}

/// ストレージディレクトリが使えればファイル保存、使えなければこのプロセス限りのメモリ保存
fn wire_store(fs: Arc<dyn FileSystem>, dirs: &Dirs, logger: Arc<dyn Log>) -> Arc<dyn KeyValueStore> {
    let native: Option<Arc<dyn KeyValueStore>> = match fs.create_dir_all(&dirs.storage_dir) {
        Ok(()) => Some(Arc::new(FileKeyValueStore::new(fs, dirs.storage_dir.clone()))),
        Err(e) => {
            let _ = logger.log(
                &LogRecord::new(LogLevel::Warn, "storage directory unavailable, memos kept in memory only")
                    .layer("wiring")
                    .kind("storage")
                    .field("path", dirs.storage_dir.display().to_string())
                    .field("error", e.to_string()),
            );
            None
        }
    };
    Arc::new(BridgeKeyValueStore::new(
        native,
        Arc::new(MemoryKeyValueStore::new()),
        logger,
    ))
}
