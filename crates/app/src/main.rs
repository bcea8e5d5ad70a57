use std::fmt;
use std::path::{Path, PathBuf};

use fiszki_core::model::{DataSnapshot, Vocabulary, Word};
use services::{Clock, ProgressService};
use storage::repository::StateStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingOperand { what: &'static str },
    InvalidIndex { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "a command is required"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingOperand { what } => write!(f, "missing operand: {what}"),
            ArgsError::InvalidIndex { raw } => write!(f, "invalid word index: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Stats,
    Category,
    Mark,
    Bookmark,
    Difficulty,
    Export,
    Import,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "category" => Some(Self::Category),
            "mark" => Some(Self::Mark),
            "bookmark" => Some(Self::Bookmark),
            "difficulty" => Some(Self::Difficulty),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    vocab_path: Option<PathBuf>,
    word_id: Option<String>,
    out_path: Option<PathBuf>,
    operands: Vec<String>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut args = std::env::args().skip(1);

        let command = match args.next() {
            None => return Err(ArgsError::MissingCommand),
            Some(first) if first == "--help" || first == "-h" => {
                print_usage();
                std::process::exit(0);
            }
            Some(first) => {
                Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?
            }
        };

        let mut db_url = normalize_sqlite_url(
            std::env::var("FISZKI_DB_URL").unwrap_or_else(|_| "sqlite:fiszki.sqlite3".into()),
        );
        let mut vocab_path = std::env::var("FISZKI_VOCAB").ok().map(PathBuf::from);
        let mut word_id = None;
        let mut out_path = None;
        let mut operands = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--vocab" => {
                    let value = require_value(&mut args, "--vocab")?;
                    vocab_path = Some(PathBuf::from(value));
                }
                "--word-id" => {
                    let value = require_value(&mut args, "--word-id")?;
                    word_id = Some(value);
                }
                "--out" => {
                    let value = require_value(&mut args, "--out")?;
                    out_path = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(ArgsError::UnknownArg(arg));
                }
                _ => operands.push(arg),
            }
        }

        Ok(Self {
            command,
            db_url,
            vocab_path,
            word_id,
            out_path,
            operands,
        })
    }

    fn operand(&self, index: usize, what: &'static str) -> Result<&str, ArgsError> {
        self.operands
            .get(index)
            .map(String::as_str)
            .ok_or(ArgsError::MissingOperand { what })
    }

    fn word_operands(&self) -> Result<Word, ArgsError> {
        Ok(Word {
            id: None,
            english: self.operand(0, "<english>")?.to_owned(),
            polish: self.operand(1, "<polish>")?.to_owned(),
            difficulty: None,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  fiszki <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats                          Overall progress statistics");
    eprintln!("  category <name>                Progress for a single category");
    eprintln!("  mark <category> <index>        Record a studied card [--word-id <id>]");
    eprintln!("  bookmark <english> <polish>    Toggle a word's bookmark");
    eprintln!("  difficulty <english> <polish>  Cycle a word's difficulty level");
    eprintln!("  export [--out <path>]          Write a JSON snapshot of all records");
    eprintln!("  import <path>                  Overwrite records from a JSON snapshot");
    eprintln!("  reset                          Delete all persisted study state");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>              SQLite URL (default: sqlite:fiszki.sqlite3)");
    eprintln!("  --vocab <path>                 Vocabulary JSON file (category -> word list)");
    eprintln!("  -h, --help                     Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  FISZKI_DB_URL, FISZKI_VOCAB");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fiszki=info,storage=info,services=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
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
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
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

fn load_vocabulary(path: &Path) -> Result<Vocabulary, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let vocabulary: Vocabulary = serde_json::from_str(&raw)?;
    Ok(vocabulary)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging();

    // Open + migrate SQLite in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let store = StateStore::sqlite(&args.db_url).await?;

    let mut service = ProgressService::new(Clock::default_clock(), store);
    if let Some(path) = &args.vocab_path {
        service.set_vocabulary(load_vocabulary(path)?);
    }

    match args.command {
        Command::Stats => {
            let stats = service.overall_stats().await?;
            println!(
                "Studied:  {} / {} words ({}%)",
                stats.total_studied, stats.total_words, stats.studied_percentage
            );
            println!("Streak:   {} day(s)", stats.study_streak);
            match stats.favorite_category {
                Some(name) => println!("Favorite: {name}"),
                None => println!("Favorite: none yet"),
            }
        }
        Command::Category => {
            let name = args.operand(0, "<name>")?;
            let progress = service.category_progress(name).await?;
            println!(
                "{name}: {} / {} ({}%)",
                progress.studied, progress.total, progress.percentage
            );
        }
        Command::Mark => {
            let category = args.operand(0, "<category>")?;
            let raw_index = args.operand(1, "<index>")?;
            let index: usize = raw_index.parse().map_err(|_| ArgsError::InvalidIndex {
                raw: raw_index.to_owned(),
            })?;

            if service
                .mark_studied(category, index, args.word_id.as_deref())
                .await?
            {
                println!("recorded");
            } else {
                println!("already studied");
            }
        }
        Command::Bookmark => {
            let word = args.word_operands()?;
            if service.toggle_bookmark(&word).await? {
                println!("bookmarked {}", word.key());
            } else {
                println!("removed bookmark {}", word.key());
            }
        }
        Command::Difficulty => {
            let word = args.word_operands()?;
            let level = service.toggle_difficulty(&word).await?;
            println!("{} is now {level}", word.key());
        }
        Command::Export => {
            let snapshot = service.export_data().await?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match &args.out_path {
                Some(path) => {
                    std::fs::write(path, json)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import => {
            let path = PathBuf::from(args.operand(0, "<path>")?);
            let raw = std::fs::read_to_string(&path)?;
            let snapshot: DataSnapshot = serde_json::from_str(&raw)?;
            service.import_data(&snapshot).await?;
            println!("imported from {}", path.display());
        }
        Command::Reset => {
            service.reset_all().await?;
            println!("all study state cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
