use std::fmt;
use std::io::{BufRead, Write as _};
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuestionId, SlotState};
use quiz_core::{Clock, Language};
use services::{
    AnswerFeedback, BankLoader, ExportFormat, IdentityDirectory, QuizService, QuizSession,
    ResetConfirmation, UserAccount, ViewDescriptor,
};
use storage::{ProgressStore, Storage};
use tracing::warn;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLanguage { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid --lang value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    bank: Option<String>,
    language: Language,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--bank <path_or_url>] [--lang <pt|en>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --lang pt");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK, QUIZ_LANG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut bank = std::env::var("QUIZ_BANK").ok();
        let mut language = std::env::var("QUIZ_LANG")
            .ok()
            .and_then(|value| Language::parse(&value))
            .unwrap_or_default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => {
                    bank = Some(require_value(args, "--bank")?);
                }
                "--lang" => {
                    let value = require_value(args, "--lang")?;
                    language = Language::parse(&value)
                        .ok_or(ArgsError::InvalidLanguage { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            bank,
            language,
        })
    }
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
    let path = std::path::Path::new(&path_str);
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

/// Accounts known to the terminal build. The `bombeiro` account is the
/// walk-up demo station: nothing it does is ever persisted.
fn account_directory() -> IdentityDirectory {
    IdentityDirectory::new()
        .with_account("aluno", UserAccount::new("quiz"))
        .with_account("instrutor", UserAccount::new("gabarito"))
        .with_account("bombeiro", UserAccount::new("resgate").persistence_exempt())
}

/// Loads the bank once at startup. A failed load keeps an empty bank and a
/// visible warning; the menu then shows every slot as missing.
async fn load_bank(loader: &BankLoader, source: Option<&str>) -> Arc<QuestionBank> {
    let Some(source) = source else {
        eprintln!("no --bank given; starting with an empty question bank");
        return Arc::new(QuestionBank::empty());
    };

    let result = if source.starts_with("http://") || source.starts_with("https://") {
        loader.fetch(source).await
    } else {
        loader.load_file(std::path::Path::new(source))
    };

    match result {
        Ok(bank) => {
            println!("loaded {} questions from {source}", bank.len());
            Arc::new(bank)
        }
        Err(err) => {
            warn!(%err, source, "question bank failed to load");
            eprintln!("could not load the question bank ({err}); all slots will show as missing");
            Arc::new(QuestionBank::empty())
        }
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    if line.is_empty() {
        return None;
    }
    Some(line.trim().to_owned())
}

fn render(view: &ViewDescriptor) {
    match view {
        ViewDescriptor::Menu { slots } => {
            let authored: Vec<_> = slots
                .iter()
                .filter(|slot| slot.state != SlotState::Missing)
                .collect();
            let done = authored
                .iter()
                .filter(|slot| slot.state == SlotState::Completed)
                .count();
            println!("menu: {done}/{} completed", authored.len());
            for slot in authored {
                let mark = match slot.state {
                    SlotState::Completed => "x",
                    _ => " ",
                };
                print!("  [{mark}] {:>3}", slot.id.value());
            }
            println!();
        }
        ViewDescriptor::Standard {
            heading,
            prompt,
            options,
            answered,
            ..
        } => {
            println!("== {heading} ==");
            if *answered {
                println!("(already answered; a new answer replaces the old one)");
            }
            println!("{prompt}");
            for (index, option) in options.iter().enumerate() {
                println!("  {index}) {option}");
            }
            println!("commands: answer <n> | back");
        }
        ViewDescriptor::Trap {
            heading,
            message,
            image,
            ..
        } => {
            println!("== {heading} ==");
            println!("{message}");
            if let Some(image) = image {
                println!("[image: {image}]");
            }
            println!("commands: back");
        }
    }
}

fn render_feedback(feedback: &AnswerFeedback) {
    println!("{}", feedback.title);
    println!("{}", feedback.evaluation.rationale);
}

async fn command_loop(
    service: &QuizService,
    session: &mut QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    render(&session.describe());

    loop {
        let Some(line) = prompt("> ") else {
            return Ok(());
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("menu" | "back") => {
                session.return_to_menu();
                render(&session.describe());
            }
            Some("open") => match parts.next().and_then(|raw| raw.parse::<QuestionId>().ok()) {
                Some(id) => {
                    let outcome = service.open_question(session, id).await;
                    render(&outcome.view);
                }
                None => println!("usage: open <1..450>"),
            },
            Some("answer") => match parts.next().and_then(|raw| raw.parse::<usize>().ok()) {
                Some(index) => match service.submit_answer(session, index).await {
                    Ok(feedback) => render_feedback(&feedback),
                    Err(err) => println!("{err}"),
                },
                None => println!("usage: answer <option>"),
            },
            Some("lang") => match parts.next().and_then(Language::parse) {
                Some(language) => {
                    session.set_language(language);
                    render(&session.describe());
                }
                None => println!("usage: lang <pt|en>"),
            },
            Some("export") => {
                let format = match parts.next() {
                    Some("csv") => ExportFormat::Csv,
                    _ => ExportFormat::Json,
                };
                match service.export(session, format) {
                    Ok(artifact) => {
                        std::fs::write(&artifact.filename, &artifact.contents)?;
                        println!("wrote {}", artifact.filename);
                    }
                    Err(err) => println!("export failed: {err}"),
                }
            }
            Some("reset") => {
                let confirmation = match prompt("erase all progress? type yes to confirm: ") {
                    Some(answer) if answer.eq_ignore_ascii_case("yes") => {
                        ResetConfirmation::Confirmed
                    }
                    _ => ResetConfirmation::Declined,
                };
                match service.reset_progress(session, confirmation).await {
                    Ok(true) => {
                        println!("progress erased");
                        render(&session.describe());
                    }
                    Ok(false) => println!("nothing reset"),
                    Err(err) => println!("reset failed: {err}"),
                }
            }
            Some("quit" | "exit") => return Ok(()),
            Some("help") => {
                println!("commands: menu | open <id> | answer <n> | back | lang <pt|en>");
                println!("          export [json|csv] | reset | quit");
            }
            Some(other) => println!("unknown command: {other} (try help)"),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let service = QuizService::new(ProgressStore::new(storage.kv), Clock::default_clock());

    let bank = load_bank(&BankLoader::new(), args.bank.as_deref()).await;
    let directory = account_directory();

    let identity = loop {
        let Some(username) = prompt("username: ") else {
            return Ok(());
        };
        let Some(password) = prompt("password: ") else {
            return Ok(());
        };
        match directory.verify(&username, &password) {
            Ok(identity) => break identity,
            Err(err) => println!("{err}"),
        }
    };

    let mut session = service.start_session(identity, bank, args.language).await?;
    command_loop(&service, &mut session).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
