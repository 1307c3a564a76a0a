mod adapter;
mod cli;
mod domain;
mod ports;
mod usecase;
mod wiring;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cli::{config_to_command, parse_args, print_completion, ParseOutcome};
use common::error::Error;
use common::ports::outbound::{LogLevel, LogRecord};
use domain::{Command, Filterable, MemoFilter, MemoKind};
use ports::inbound::UseCaseRunner;
use usecase::{favorite_memos, DeleteOutcome, LoadOutcome, Poller, SubmitMemo};
use wiring::{wire_memox, App};

/// watch 中に表示を更新する間隔
const WATCH_REFRESH: Duration = Duration::from_millis(500);

/// Command をディスパッチする Runner（match は main レイヤーに集約）
struct Runner {
    app: App,
}

impl UseCaseRunner for Runner {
    fn run(&self, command: Command) -> Result<i32, Error> {
        let command_name = cmd_name_for_log(&command);
        let _ = self.app.logger.log(
            &LogRecord::new(LogLevel::Info, "command started")
                .layer("cli")
                .kind("lifecycle")
                .field("command", command_name),
        );

        let result = self.dispatch(command);

        let code = result.as_ref().copied().unwrap_or(0);
        let _ = self.app.logger.log(
            &LogRecord::new(LogLevel::Info, "command finished")
                .layer("cli")
                .kind("lifecycle")
                .field("command", command_name)
                .field("exit_code", code),
        );
        if let Err(ref e) = result {
            let _ = self.app.logger.log(
                &LogRecord::new(LogLevel::Error, e.to_string())
                    .layer("cli")
                    .kind("error"),
            );
        }
        result
    }
}

impl Runner {
    fn dispatch(&self, command: Command) -> Result<i32, Error> {
        let repo = &self.app.repo;
        match command {
            Command::Help => {
                print_help();
                Ok(0)
            }
            Command::Received { more, filter } => {
                if let LoadOutcome::Failed(e) = repo.refresh_received() {
                    // 同期できなくても端末に残っている分は見せる
                    let local = repo.cached_received()?;
                    self.print_list(&local, &filter)?;
                    return Ok(e.exit_code());
                }
                if more && repo.has_more_received() {
                    if let LoadOutcome::Failed(e) = repo.load_more_received() {
                        return Err(e);
                    }
                }
                self.print_list(&repo.received(), &filter)?;
                Ok(0)
            }
            Command::Sent { more, filter } => {
                if let LoadOutcome::Failed(e) = repo.load_sent(false) {
                    return Err(e);
                }
                if more && repo.has_more_sent() {
                    if let LoadOutcome::Failed(e) = repo.load_sent(true) {
                        return Err(e);
                    }
                }
                self.print_list(&repo.sent(), &filter)?;
                Ok(0)
            }
            Command::Send {
                to,
                subject,
                message,
                broadcast,
                ttl_days,
            } => {
                let input = SubmitMemo {
                    to: to.unwrap_or_default(),
                    subject,
                    message,
                    is_broadcast: broadcast,
                    ttl_days,
                };
                Ok(if repo.submit(&input)? { 0 } else { 1 })
            }
            Command::DeleteReceived { id } => {
                match repo.delete_received(&id)? {
                    DeleteOutcome::Deleted => println!("Deleted {}", id),
                    DeleteOutcome::AlreadyInProgress => println!("Delete of {} already in progress", id),
                }
                Ok(0)
            }
            Command::DeleteSent { id } => {
                repo.delete_sent(&id)?;
                println!("Deleted {}", id);
                Ok(0)
            }
            Command::Favorite { id } => {
                if self.app.favorites.toggle(&id)? {
                    println!("Added {} to favorites", id);
                } else {
                    println!("Removed {} from favorites", id);
                }
                Ok(0)
            }
            Command::Favorites { filter } => {
                let received = repo.cached_received()?;
                // 送信分はサーバーからしか取れない。取れなければ受信分だけ出す
                let _ = repo.load_sent(false);
                let favorites = self.app.favorites.load()?;
                let memos = favorite_memos(&received, &repo.sent(), &favorites);
                self.print_list(&memos, &filter)?;
                Ok(0)
            }
            Command::Archive { id, kind } => {
                if kind == MemoKind::Sent {
                    if let LoadOutcome::Failed(e) = repo.load_sent(false) {
                        return Err(e);
                    }
                }
                if !self.app.archive_use_case.archive(&id, kind)? {
                    return Err(Error::invalid_argument(format!("Memo not found: {}", id)));
                }
                println!("Archived {}", id);
                Ok(0)
            }
            Command::Archived { filter } => {
                let archived = self.app.archive.list()?;
                self.print_list(&archived, &filter)?;
                Ok(0)
            }
            Command::Unarchive { id } => {
                if !self.app.archive.remove(&id)? {
                    return Err(Error::invalid_argument(format!("Memo not in archive: {}", id)));
                }
                println!("Removed {} from the archive", id);
                Ok(0)
            }
            Command::Users => {
                let users = self.app.users.load();
                if users.is_empty() {
                    println!("(no users)");
                }
                for u in users {
                    println!("{}", u);
                }
                Ok(0)
            }
            Command::ClearCache => {
                repo.clear_local_cache()?;
                println!("Local memo cache cleared");
                Ok(0)
            }
            Command::Watch => self.watch(),
            Command::WhoAmI => {
                let data = self.app.tokens.token_data()?;
                if data.email.is_empty() {
                    println!("(unknown user)");
                } else {
                    println!("{}", data.email);
                }
                Ok(0)
            }
        }
    }

    /// Ctrl-C まで受信メモをポーリングし、新着を表示し続ける
    fn watch(&self) -> Result<i32, Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .map_err(|e| Error::system(format!("Failed to install Ctrl-C handler: {}", e)))?;

        let repo = &self.app.repo;
        let favorites = self.app.favorites.load()?;
        let mut shown = HashSet::new();
        let _ = repo.refresh_received();
        print_new(&repo.received(), &favorites, &mut shown);

        let poller = Poller::spawn(
            Arc::clone(repo),
            self.app.config.poll_interval(),
            Arc::clone(&stop),
            Arc::clone(&self.app.logger),
        );
        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(WATCH_REFRESH);
            print_new(&repo.received(), &favorites, &mut shown);
        }
        poller
            .join()
            .map_err(|_| Error::system("poller thread panicked"))?;
        Ok(0)
    }

    fn print_list<M: Filterable>(&self, memos: &[M], filter: &MemoFilter) -> Result<(), Error> {
        let favorites = self.app.favorites.load()?;
        let visible = filter.apply(memos);
        if visible.is_empty() {
            if filter.is_empty() {
                println!("(no memos)");
            } else {
                println!("(no memos match the filter)");
            }
            return Ok(());
        }
        for m in visible {
            println!("{}", format_memo(m, &favorites));
        }
        Ok(())
    }
}

fn print_new<M: Filterable>(memos: &[M], favorites: &HashSet<String>, shown: &mut HashSet<String>) {
    for m in memos {
        if shown.insert(m.id().to_string()) {
            println!("{}", format_memo(m, favorites));
        }
    }
}

fn format_memo<M: Filterable>(m: &M, favorites: &HashSet<String>) -> String {
    let star = if favorites.contains(m.id()) { "*" } else { " " };
    let to = if m.is_broadcast() { "(all)" } else { m.to() };
    let date: String = m.display_date().chars().take(10).collect();
    format!(
        "{} {:<36} {:<10} {:<24} {:<24} {}",
        star,
        m.id(),
        date,
        m.from(),
        to,
        truncate(m.subject(), 50)
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn cmd_name_for_log(cmd: &Command) -> &'static str {
    match cmd {
        Command::Help => "help",
        Command::Received { .. } => "received",
        Command::Sent { .. } => "sent",
        Command::Send { .. } => "send",
        Command::DeleteReceived { .. } => "delete-received",
        Command::DeleteSent { .. } => "delete-sent",
        Command::Favorite { .. } => "favorite",
        Command::Favorites { .. } => "favorites",
        Command::Archive { .. } => "archive",
        Command::Archived { .. } => "archived",
        Command::Unarchive { .. } => "unarchive",
        Command::Users => "users",
        Command::ClearCache => "clear-cache",
        Command::Watch => "watch",
        Command::WhoAmI => "whoami",
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            let err = e.downcast_ref::<Error>();
            if err.is_some_and(Error::is_usage) {
                print_usage();
            }
            eprintln!("memox: {:#}", e);
            err.map(Error::exit_code).unwrap_or(70)
        }
    };
    process::exit(exit_code);
}

fn print_usage() {
    eprintln!("Usage: memox [-h] [-d|--home-dir directory] [--generate shell] <command> [args...]");
}

fn print_help() {
    println!("Usage: memox [-h] [-d|--home-dir directory] [--generate shell] <command> [args...]");
    println!("  -h, --help            Display this help message.");
    println!("  -d, --home-dir        Specify a home directory (overrides MEMOX_HOME).");
    println!("  --generate <shell>    Generate shell completion script (bash, zsh, fish).");
    println!();
    println!("Environment:");
    println!("  MEMOX_HOME        Home directory (config.json, storage/, logs/). Default: $XDG_CONFIG_HOME/memox or ~/.config/memox.");
    println!("  MEMOX_API_URL     Backend base URL (overrides apiUrl in config.json).");
    println!("  MEMOX_TOKEN_FILE  File holding the bearer token (overrides tokenFile). Without it a development token is used.");
    println!();
    println!("Commands:");
    println!("  received [--more]          Sync and list received memos.");
    println!("  sent [--more]              List sent memos.");
    println!("      list filters: --search <text> --from-date <YYYY-MM-DD> --to-date <YYYY-MM-DD> --broadcast-only");
    println!("  send --to <email> --subject <text> --message <text> [--broadcast] [--ttl <days>]");
    println!("                             Send a memo (TTL 1-365 days, omit to keep forever).");
    println!("  delete-received <id>       Delete a received memo from this device (it will not come back).");
    println!("  delete-sent <id>           Delete a sent memo on the server.");
    println!("  favorite <id>              Toggle the favorite mark.");
    println!("  favorites                  List favorite memos.");
    println!("  archive <id> [--sent]      Move a memo into the archive.");
    println!("  archived                   List archived memos.");
    println!("  unarchive <id>             Delete a memo from the archive permanently.");
    println!("  users                      List known users.");
    println!("  clear-cache                Clear locally stored memos and deleted IDs.");
    println!("  watch                      Poll for received memos until Ctrl-C.");
    println!("  whoami                     Show the signed-in user.");
}

pub fn run() -> anyhow::Result<i32> {
    let outcome = parse_args()?;
    let config = match &outcome {
        ParseOutcome::Config(c) => c.clone(),
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(*shell);
            return Ok(0);
        }
    };
    let command = config_to_command(&config);
    if command == Command::Help {
        print_help();
        return Ok(0);
    }
    let app = wire_memox(config.home_dir.as_deref()).context("failed to initialize memox")?;
    let runner = Runner { app };
    Ok(runner.run(command)?)
}
