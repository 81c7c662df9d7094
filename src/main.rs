//! # shiftboard
//!
//! Administrator command line for the shift service

#![deny(
    clippy::undocumented_unsafe_blocks,
    clippy::missing_safety_doc,
    reason = "multi-person projects should document dangers"
)]
#![warn(missing_docs)]
#![cfg_attr(
    not(any(test, debug_assertions)),
    deny(
        clippy::missing_panics_doc,
        clippy::panic,
        clippy::unimplemented,
        clippy::unwrap_used,
        reason = "prefer errors over panicking"
    )
)]
#![cfg_attr(
    not(any(test, debug_assertions)),
    forbid(clippy::todo, reason = "production code should not use `todo`")
)]

use chrono::{Datelike, NaiveDate};
use clap::{
    Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use itertools::Itertools;
use miette::{LabeledSpan, Report, Result, Severity, miette};
use shiftboard::{
    api::{HttpApi, MemoryApi, ShiftApi, Snapshot},
    config::{Config, Overrides},
    data::{
        ClockTime, TIME_PLACEHOLDER, User, UserId, WeekdayPolicy, YearMonth, find_user,
        similar_usernames,
    },
    error::OpError,
    export,
    ops::Board,
    recon::Grid,
    submit::{NewRequest, open_dates},
};
use std::{
    fs::File,
    io::{BufRead, BufWriter},
    path::{Path, PathBuf},
};

const STYLE: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightCyan.on_default().bold())
    .placeholder(AnsiColor::Cyan.on_default());

/// Reconcile shift requests with confirmed shifts
#[derive(Debug, Parser)]
#[command(
    version,
    propagate_version = true,
    about,
    long_about = None,
    styles = STYLE,
    color = clap::ColorChoice::Always,
)]
struct Cli {
    /// Read settings from this file instead of `./shiftboard.toml`
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the shift service
    #[arg(long, global = true, value_name = "URL", env = "SHIFTBOARD_API_URL")]
    api_url: Option<String>,

    /// Bearer token from `login`
    #[arg(long, global = true, env = "SHIFTBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Work against a JSON snapshot instead of the service; mutations are written back
    #[arg(long, global = true, value_name = "SNAPSHOT.json")]
    offline: Option<PathBuf>,

    /// Do not print warnings about unreadable records
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Board(BoardCommand),

    /// Add an availability request to the snapshot (offline only)
    Submit {
        /// User id or username
        #[arg(short, long)]
        user: String,

        /// Day of the request, `YYYY-MM-DD`
        #[arg(short, long)]
        date: NaiveDate,

        /// Earliest start, `HH:mm`
        #[arg(long, requires = "end")]
        start: Option<ClockTime>,

        /// Latest end, `HH:mm`
        #[arg(long, requires = "start")]
        end: Option<ClockTime>,

        /// The user cannot work that day
        #[arg(long, conflicts_with_all = ["start", "end"])]
        cannot: bool,

        /// Free-form note, at most 200 characters
        #[arg(long)]
        note: Option<String>,
    },

    /// Exchange a username and password for a bearer token
    Login {
        /// Administrator username
        #[arg(long)]
        username: String,

        /// Read from standard input when not given
        #[arg(long, env = "SHIFTBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum BoardCommand {
    /// Print the reconciled grid and summary
    Grid {
        /// `YYYY-MM`, defaults to the current month
        #[arg(short, long)]
        month: Option<YearMonth>,

        /// Also write the grid to this CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Show a single user's days instead of the whole table
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Confirm an available request as a shift
    Confirm {
        /// User id or username
        #[arg(short, long)]
        user: String,

        /// Day of the shift, `YYYY-MM-DD`
        #[arg(short, long)]
        date: NaiveDate,

        /// Overrides the requested start, `HH:mm`
        #[arg(long)]
        start: Option<ClockTime>,

        /// Overrides the requested end, `HH:mm`
        #[arg(long)]
        end: Option<ClockTime>,
    },

    /// Confirm every available request that has both times
    BulkConfirm {
        /// `YYYY-MM`, defaults to the current month
        #[arg(short, long)]
        month: Option<YearMonth>,

        /// Create the shifts instead of listing them
        #[arg(short, long)]
        yes: bool,
    },

    /// Change the times of a confirmed shift
    Edit {
        /// User id or username
        #[arg(short, long)]
        user: String,

        /// Day of the shift, `YYYY-MM-DD`
        #[arg(short, long)]
        date: NaiveDate,

        /// New start, `HH:mm`
        #[arg(long)]
        start: ClockTime,

        /// New end, `HH:mm`
        #[arg(long)]
        end: ClockTime,
    },

    /// Remove a confirmed shift
    Delete {
        /// User id or username
        #[arg(short, long)]
        user: String,

        /// Day of the shift, `YYYY-MM-DD`
        #[arg(short, long)]
        date: NaiveDate,
    },

    /// Show or replace the schedulable weekdays
    Weekdays {
        /// Comma-separated day names, e.g. `mon,wed,fri`, or `none`
        #[arg(long, value_name = "DAYS")]
        set: Option<WeekdayPolicy>,
    },
}

impl BoardCommand {
    fn mutates(&self) -> bool {
        match self {
            Self::Grid { .. } => false,
            Self::BulkConfirm { yes, .. } => *yes,
            Self::Weekdays { set } => set.is_some(),
            Self::Confirm { .. } | Self::Edit { .. } | Self::Delete { .. } => true,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let Cli {
        config,
        api_url,
        token,
        offline,
        quiet,
        command,
    } = match Cli::try_parse() {
        Ok(x) => Ok(x),
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            return e.print().map_err(miette::Error::from_err);
        }
        Err(e) => Err(miette::Error::from_err(e)),
    }?;

    let config = Config::load(config.as_deref())?.with_overrides(Overrides {
        api_url,
        token,
        snapshot: offline,
    });

    let Some(path) = config.snapshot.clone() else {
        return match command {
            Command::Board(command) => run(&HttpApi::new(&config)?, command, quiet).await,
            Command::Login { username, password } => {
                login(&config, &username, password, quiet).await
            }
            Command::Submit { .. } => Err(miette!(
                severity = Severity::Error,
                help = "employees submit through the service; pass `--offline` to edit a snapshot",
                "`submit` only works offline"
            )),
        };
    };

    let api = MemoryApi::new(Snapshot::load(&path)?);
    match command {
        Command::Board(command) => {
            let mutates = command.mutates();
            let result = run(&api, command, quiet).await;
            // shifts created before a failure are kept, so they are saved too
            if mutates {
                save(&api, &path)?;
            }
            result
        }
        Command::Submit {
            user,
            date,
            start,
            end,
            cannot,
            note,
        } => {
            let request = match (cannot, start, end) {
                (true, _, _) => NewRequest::unavailable(date),
                (false, Some(start), Some(end)) => NewRequest::available(date, start, end),
                (false, _, _) => {
                    return Err(miette!(
                        severity = Severity::Error,
                        help = "pass both `--start` and `--end`, or `--cannot`",
                        "an available request needs a start and an end"
                    ));
                }
            };
            let request = match note {
                Some(note) => request.with_description(note),
                None => request,
            };
            submit(&api, &user, request)?;
            save(&api, &path)
        }
        Command::Login { .. } => Err(miette!(
            severity = Severity::Error,
            help = "drop `--offline` and the `snapshot` setting to log in",
            "`login` needs the service"
        )),
    }
}

fn save(api: &MemoryApi, path: &Path) -> Result<()> {
    api.snapshot().save(path)?;
    Ok(())
}

/// Run one administrator command against `api`.
async fn run<A: ShiftApi>(api: A, command: BoardCommand, quiet: bool) -> Result<()> {
    match command {
        BoardCommand::Grid { month, csv, user } => {
            let board = Board::load(api, month.unwrap_or_else(YearMonth::current)).await?;
            let grid = board.grid();
            print_warnings(grid, quiet);

            match user {
                Some(needle) => print_row(grid, resolve_user(&grid_users(grid), &needle)?),
                None => {
                    let mut table = String::new();
                    export::write_table(grid, &mut table).map_err(miette::Error::from_err)?;
                    print!("{table}");
                }
            }
            println!("{}", export::summary_line(&grid.summary()));
            let unreadable = grid.placeholder_count();
            if unreadable > 0 && !quiet {
                eprintln!("{unreadable} cells show {TIME_PLACEHOLDER} for an unreadable time");
            }

            if let Some(path) = csv {
                let file = File::create(&path).map_err(|e| {
                    let source = path.display().to_string();
                    miette!(
                        severity = Severity::Error,
                        labels = vec![LabeledSpan::at(0..source.len(), e.to_string())],
                        help = "make sure the directory exists and can be written",
                        "could not create CSV file"
                    )
                    .with_source_code(source)
                })?;
                export::write_csv(grid, BufWriter::new(file)).map_err(miette::Error::from_err)?;
            }
        }

        BoardCommand::Confirm {
            user,
            date,
            start,
            end,
        } => {
            let mut board = Board::load(api, YearMonth::of(date)).await?;
            print_warnings(board.grid(), quiet);
            let user = resolve_user(&grid_users(board.grid()), &user)?;
            let id = board.confirm(user, date, start, end).await?;
            print_saved(board.grid(), user, date, &format!("confirmed {id}"));
        }

        BoardCommand::BulkConfirm { month, yes } => {
            let mut board = Board::load(api, month.unwrap_or_else(YearMonth::current)).await?;
            print_warnings(board.grid(), quiet);

            let candidates = board.grid().bulk_candidates();
            if candidates.is_empty() {
                println!("nothing to confirm in {}", board.month());
                return Ok(());
            }
            for candidate in &candidates {
                println!("  {candidate}");
            }
            if !yes {
                println!("run again with `--yes` to confirm these {} shifts", candidates.len());
                return Ok(());
            }

            let (report, stale) = match board.bulk_confirm().await {
                Ok(report) => (report, None),
                Err(OpError::StaleBulk { report, source }) => (*report, Some(source)),
                Err(e) => return Err(e.into()),
            };
            println!("confirmed {} of {}", report.confirmed.len(), candidates.len());
            let failed = report.failed.len();
            for (candidate, error) in report.failed {
                let context = format!("could not confirm {candidate}");
                eprintln!("{:?}", Report::new(error).wrap_err(context));
            }
            if let Some(source) = stale {
                return Err(Report::new(source).wrap_err("the grid could not be reloaded"));
            }
            if failed > 0 {
                return Err(miette!(
                    severity = Severity::Error,
                    help = "the other shifts were created; fix the refused ones and run again",
                    "{failed} shifts could not be confirmed"
                ));
            }
        }

        BoardCommand::Edit {
            user,
            date,
            start,
            end,
        } => {
            let mut board = Board::load(api, YearMonth::of(date)).await?;
            print_warnings(board.grid(), quiet);
            let user = resolve_user(&grid_users(board.grid()), &user)?;
            let id = board.edit(user, date, start, end).await?;
            print_saved(board.grid(), user, date, &format!("updated {id}"));
        }

        BoardCommand::Delete { user, date } => {
            let mut board = Board::load(api, YearMonth::of(date)).await?;
            print_warnings(board.grid(), quiet);
            let user = resolve_user(&grid_users(board.grid()), &user)?;
            let id = board.delete(user, date).await?;
            print_saved(board.grid(), user, date, &format!("deleted {id}"));
        }

        BoardCommand::Weekdays { set: None } => {
            println!("{}", api.weekday_policy().await?);
        }

        BoardCommand::Weekdays { set: Some(policy) } => {
            let mut board = Board::load(api, YearMonth::current()).await?;
            let stored = board.set_policy(policy).await?;
            println!("{stored}");
            println!("{} schedulable dates in {}", board.grid().dates().len(), board.month());
        }
    }
    Ok(())
}

/// Everyone with a row on the grid.
fn grid_users(grid: &Grid) -> Vec<User> {
    grid.rows().iter().map(|row| row.user.clone()).collect_vec()
}

/// Find `needle` by id or username, suggesting close usernames when it is not there.
fn resolve_user(users: &[User], needle: &str) -> Result<UserId> {
    if let Some(user) = find_user(users, needle) {
        return Ok(user.id);
    }
    let similar = similar_usernames(users, needle);
    let help = if similar.is_empty() {
        "pass a user id or an exact username".to_string()
    } else {
        format!(
            "did you mean {}?",
            similar.iter().map(|name| format!("`{name}`")).join(" or ")
        )
    };
    Err(miette!(
        severity = Severity::Error,
        labels = vec![LabeledSpan::at(0..needle.len(), "no such employee")],
        help = help,
        "unknown user"
    )
    .with_source_code(needle.to_string()))
}

fn print_warnings(grid: &Grid, quiet: bool) {
    if quiet {
        return;
    }
    for warning in grid.warnings() {
        eprintln!("{:?}", Report::new(warning.clone()));
    }
}

fn print_saved(grid: &Grid, user: UserId, date: NaiveDate, what: &str) {
    match grid.cell(user, date) {
        Some(cell) => println!("{what}; {date} now shows {}", cell.status),
        None => println!("{what}"),
    }
}

/// One line per date for `user`, with the note left on the request if any.
fn print_row(grid: &Grid, user: UserId) {
    let Some(row) = grid.row(user) else {
        return;
    };
    println!("{} ({})", row.user.display_name, row.user.username);
    for cell in &row.cells {
        let date = cell.date;
        let kind: &'static str = cell.kind().into();
        print!("{date} {:<4} {kind:<14} {}", date.weekday().to_string(), cell.status);
        match &cell.description {
            Some(note) => println!("  # {note}"),
            None => println!(),
        }
    }
    println!("total {}", row.confirmed_total());
}

fn submit(api: &MemoryApi, user: &str, request: NewRequest) -> Result<()> {
    let snapshot = api.snapshot();
    let user = resolve_user(&snapshot.users, user)?;
    let month = YearMonth::of(request.date);
    let stored = api.submit_request(user, request)?;
    println!("submitted {} for {}", stored.id, stored.date);

    let snapshot = api.snapshot();
    let open = open_dates(month, snapshot.policy, &snapshot.requests, user);
    println!(
        "{} dates in {month} still open: {}",
        open.len(),
        open.iter().map(|date| date.day()).join(", ")
    );
    Ok(())
}

async fn login(
    config: &Config,
    username: &str,
    password: Option<String>,
    quiet: bool,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(miette::Error::from_err)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let api = HttpApi::new(config)?;
    let token = api.login(username, &password).await?;
    // the admin endpoints refuse tokens of ordinary users
    api.with_token(token.access_token.clone()).users().await?;

    println!("{}", token.access_token);
    if !quiet {
        eprintln!("set SHIFTBOARD_TOKEN or `token` in {} to use it", Config::FILE_NAME);
    }
    Ok(())
}
