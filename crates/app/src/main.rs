use std::fmt;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use drill_core::model::{Difficulty, SessionConfig, SessionRecord, UserId};
use services::{
    Clock, DEFAULT_HISTORY_LIMIT, HistoryService, PracticeError, PracticeOptions, PracticeService,
    SubmitOutcome,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_URL: &str = "sqlite://drill.sqlite3";

#[derive(Debug)]
enum AppError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for AppError {}

#[derive(Parser, Debug)]
#[command(name = "drill", version, about = "Multiplication table practice")]
struct Cli {
    /// `SQLite` URL or file path for session history
    #[arg(long, global = true, env = "DRILL_DB_URL", default_value = DEFAULT_DB_URL)]
    db: String,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a round of multiplication questions
    Practice {
        /// Tables to practice, comma separated (e.g. 12,13)
        #[arg(
            long,
            value_delimiter = ',',
            num_args = 1..,
            required = true,
            allow_negative_numbers = true
        )]
        operands: Vec<i32>,

        /// normal (x1..x10) or hard (x5..x10)
        #[arg(long, default_value_t = Difficulty::Normal)]
        difficulty: Difficulty,

        /// Number of questions in the round
        #[arg(long, default_value_t = 10)]
        count: u32,

        /// Learner name; sessions are saved only when set
        #[arg(long, env = "DRILL_USER")]
        user: Option<UserId>,

        /// Pause after each answer, in milliseconds
        #[arg(long, default_value_t = 500)]
        feedback_ms: u64,

        /// Fixed seed for a reproducible question order
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List a learner's finished sessions
    History {
        #[arg(long, env = "DRILL_USER")]
        user: UserId,

        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // stdout is reserved for the drill itself.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| AppError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(AppError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_storage(raw_url: &str) -> Result<Storage, Box<dyn std::error::Error>> {
    if raw_url.trim().is_empty() {
        return Err(AppError::InvalidDbUrl {
            raw: raw_url.to_string(),
        }
        .into());
    }
    let db_url = normalize_sqlite_url(raw_url);
    prepare_sqlite_file(&db_url)?;
    debug!(%db_url, "opening session store");
    Ok(Storage::sqlite(&db_url).await?)
}

fn prompt(text: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    write!(out, "{text}")?;
    out.flush()
}

fn print_summary(record: &SessionRecord) {
    println!();
    println!(
        "Done! {} correct, {} incorrect out of {}.",
        record.correct(),
        record.incorrect(),
        record.total_questions()
    );
    for entry in record.progress() {
        let given = entry
            .user_answer
            .map_or_else(|| "-".to_string(), |answer| answer.to_string());
        let mark = if entry.is_correct { "✔" } else { "✘" };
        println!(
            "  {:>4}  {} × {} = {:<6} {mark}",
            entry.label(),
            entry.operand,
            entry.multiplier,
            given
        );
    }
}

async fn run_practice(
    db: &str,
    config: SessionConfig,
    user: Option<UserId>,
    feedback: Duration,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Anonymous rounds are never written, so skip opening the database.
    let storage = match &user {
        Some(_) => open_storage(db).await?,
        None => Storage::in_memory(),
    };
    let practice = PracticeService::with_options(
        Clock::default(),
        Arc::clone(&storage.records),
        PracticeOptions {
            feedback_delay: feedback,
            seed,
            identity: user,
        },
    );

    let started = practice.start(config).await?;
    info!(total = started.total, "round ready");
    println!("{} questions. Type `q` to quit.", started.total);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = practice.snapshot();
        let Some(question) = snapshot.question else {
            break;
        };
        prompt(&format!(
            "[{}/{}] {question} = ",
            snapshot.question_number, snapshot.total
        ))?;

        let Some(line) = lines.next_line().await? else {
            println!();
            println!("Round abandoned.");
            return Ok(());
        };
        if matches!(line.trim(), "q" | "quit") {
            println!("Round abandoned.");
            return Ok(());
        }

        match practice.submit_answer(&line).await {
            Ok(SubmitOutcome::Scored { verdict, .. }) => {
                if verdict.is_correct {
                    println!("{}", verdict.message);
                } else {
                    println!("{} (answer: {})", verdict.message, verdict.expected);
                }
                practice.settle().await;
            }
            Ok(SubmitOutcome::Completed { verdict, record }) => {
                println!("{}", verdict.message);
                print_summary(&record);
                break;
            }
            Ok(SubmitOutcome::Ignored) => {}
            Err(PracticeError::Validation(err)) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    if practice.identity().is_some() {
        match practice.wait_for_persistence().await {
            Some(id) => println!("Saved as session #{id}."),
            None => eprintln!("Could not save this session."),
        }
    }
    Ok(())
}

async fn run_history(
    db: &str,
    user: &UserId,
    limit: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db).await?;
    let history = HistoryService::new(Arc::clone(&storage.records));
    let items = history.history(user, limit).await?;

    if items.is_empty() {
        println!("No sessions recorded for {user}.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:>7} {:>9} {:>5}  completed",
        "session", "mode", "correct", "incorrect", "total"
    );
    for item in &items {
        println!(
            "{:<12} {:<8} {:>7} {:>9} {:>5}  {}",
            item.label,
            item.difficulty,
            item.correct,
            item.incorrect,
            item.total,
            item.completed_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Practice {
            operands,
            difficulty,
            count,
            user,
            feedback_ms,
            seed,
        } => {
            let config = SessionConfig::new(operands, difficulty, count);
            run_practice(
                &cli.db,
                config,
                user,
                Duration::from_millis(feedback_ms),
                seed,
            )
            .await
        }
        Command::History { user, limit } => run_history(&cli.db, &user, limit).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
