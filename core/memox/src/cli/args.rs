use crate::domain::{parse_date, Command, MemoFilter, MemoKind};
use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;
use std::ffi::OsString;

/// CLI から受け取った設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub help: bool,
    pub home_dir: Option<String>,
    pub command: Command,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            help: false,
            home_dir: None,
            command: Command::Help,
        }
    }
}

/// 解析結果: 通常の Config または補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn global_args(cmd: clap::Command) -> clap::Command {
    cmd.disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Print help")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("home-dir")
                .short('d')
                .long("home-dir")
                .value_name("directory")
                .help("Specify a home directory (overrides MEMOX_HOME)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
}

fn filter_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::Arg::new("search")
            .long("search")
            .value_name("text")
            .help("Case-insensitive match on subject, message, sender and recipient")
            .num_args(1),
    )
    .arg(
        clap::Arg::new("from-date")
            .long("from-date")
            .value_name("YYYY-MM-DD")
            .help("Only memos on or after this day")
            .num_args(1),
    )
    .arg(
        clap::Arg::new("to-date")
            .long("to-date")
            .value_name("YYYY-MM-DD")
            .help("Only memos on or before this day")
            .num_args(1),
    )
    .arg(
        clap::Arg::new("broadcast-only")
            .long("broadcast-only")
            .help("Only broadcast memos")
            .action(ArgAction::SetTrue),
    )
}

fn more_arg(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::Arg::new("more")
            .long("more")
            .help("Also load the next page")
            .action(ArgAction::SetTrue),
    )
}

fn id_arg(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::Arg::new("id").required(true).value_name("id"))
}

fn build_send_subcommand() -> clap::Command {
    clap::Command::new("send")
        .about("Send a memo")
        .arg(
            clap::Arg::new("to")
                .long("to")
                .value_name("email")
                .help("Recipient e-mail address")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("subject")
                .long("subject")
                .value_name("text")
                .required(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("message")
                .long("message")
                .value_name("text")
                .required(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("broadcast")
                .long("broadcast")
                .help("Send to everyone")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("ttl")
                .long("ttl")
                .value_name("days")
                .help("Days the memo stays visible (1-365, omit to keep forever)")
                .value_parser(value_parser!(i64))
                .num_args(1),
        )
}

pub(crate) fn build_clap_command() -> clap::Command {
    global_args(
        clap::Command::new("memox")
            .about("Local-first memo client")
            .subcommand_required(false)
            .disable_help_subcommand(true)
            .subcommand(clap::Command::new("help").about("Display this help message"))
            .subcommand(filter_args(more_arg(
                clap::Command::new("received").about("Sync and list received memos"),
            )))
            .subcommand(filter_args(more_arg(
                clap::Command::new("sent").about("List sent memos"),
            )))
            .subcommand(build_send_subcommand())
            .subcommand(id_arg(
                clap::Command::new("delete-received")
                    .about("Delete a received memo from this device"),
            ))
            .subcommand(id_arg(
                clap::Command::new("delete-sent").about("Delete a sent memo on the server"),
            ))
            .subcommand(id_arg(
                clap::Command::new("favorite").about("Toggle the favorite mark of a memo"),
            ))
            .subcommand(filter_args(
                clap::Command::new("favorites").about("List favorite memos"),
            ))
            .subcommand(
                id_arg(clap::Command::new("archive").about("Move a memo into the archive")).arg(
                    clap::Arg::new("sent")
                        .long("sent")
                        .help("Archive a sent memo instead of a received one")
                        .action(ArgAction::SetTrue),
                ),
            )
            .subcommand(filter_args(
                clap::Command::new("archived").about("List archived memos"),
            ))
            .subcommand(id_arg(
                clap::Command::new("unarchive").about("Delete a memo from the archive permanently"),
            ))
            .subcommand(clap::Command::new("users").about("List known users"))
            .subcommand(
                clap::Command::new("clear-cache")
                    .about("Clear locally stored memos and deleted IDs"),
            )
            .subcommand(clap::Command::new("watch").about("Poll for received memos until Ctrl-C"))
            .subcommand(clap::Command::new("whoami").about("Show the signed-in user")),
    )
}

fn matches_to_filter(m: &clap::ArgMatches) -> Result<MemoFilter, Error> {
    let date = |name: &str| -> Result<_, Error> {
        m.get_one::<String>(name).map(|s| parse_date(s)).transpose()
    };
    Ok(MemoFilter {
        search: m.get_one::<String>("search").cloned().unwrap_or_default(),
        start_date: date("from-date")?,
        end_date: date("to-date")?,
        broadcast_only: m.get_flag("broadcast-only"),
    })
}

fn id_of(m: &clap::ArgMatches) -> String {
    m.get_one::<String>("id").cloned().unwrap_or_default()
}

fn matches_to_command(matches: &clap::ArgMatches) -> Result<Command, Error> {
    let command = match matches.subcommand() {
        None | Some(("help", _)) => Command::Help,
        Some(("received", m)) => Command::Received {
            more: m.get_flag("more"),
            filter: matches_to_filter(m)?,
        },
        Some(("sent", m)) => Command::Sent {
            more: m.get_flag("more"),
            filter: matches_to_filter(m)?,
        },
        Some(("send", m)) => Command::Send {
            to: m.get_one::<String>("to").cloned(),
            subject: m.get_one::<String>("subject").cloned().unwrap_or_default(),
            message: m.get_one::<String>("message").cloned().unwrap_or_default(),
            broadcast: m.get_flag("broadcast"),
            ttl_days: m.get_one::<i64>("ttl").copied(),
        },
        Some(("delete-received", m)) => Command::DeleteReceived { id: id_of(m) },
        Some(("delete-sent", m)) => Command::DeleteSent { id: id_of(m) },
        Some(("favorite", m)) => Command::Favorite { id: id_of(m) },
        Some(("favorites", m)) => Command::Favorites {
            filter: matches_to_filter(m)?,
        },
        Some(("archive", m)) => Command::Archive {
            id: id_of(m),
            kind: if m.get_flag("sent") {
                MemoKind::Sent
            } else {
                MemoKind::Received
            },
        },
        Some(("archived", m)) => Command::Archived {
            filter: matches_to_filter(m)?,
        },
        Some(("unarchive", m)) => Command::Unarchive { id: id_of(m) },
        Some(("users", _)) => Command::Users,
        Some(("clear-cache", _)) => Command::ClearCache,
        Some(("watch", _)) => Command::Watch,
        Some(("whoami", _)) => Command::WhoAmI,
        Some((name, _)) => {
            return Err(Error::invalid_argument(format!(
                "Command '{}' is not implemented.",
                name
            )))
        }
    };
    Ok(command)
}

/// 任意の引数列を解析する（先頭はプログラム名）
pub fn parse_args_from<I, T>(args: I) -> Result<ParseOutcome, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_clap_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;

    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }

    Ok(ParseOutcome::Config(Config {
        help: matches.get_flag("help"),
        home_dir: matches.get_one::<String>("home-dir").cloned(),
        command: matches_to_command(&matches)?,
    }))
}

/// コマンドラインを解析する。補完生成が要求された場合は ParseOutcome::GenerateCompletion を返す。
pub fn parse_args() -> Result<ParseOutcome, Error> {
    parse_args_from(std::env::args_os())
}

/// 補完スクリプトを標準出力に出力する
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "memox", &mut std::io::stdout());
}

/// Config を Command に変換する
pub fn config_to_command(config: &Config) -> Command {
    if config.help {
        return Command::Help;
    }
    config.command.clone()
}
