use clap::{ArgAction, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{
    error::Error,
    fs,
    io::{self, Read},
    path::PathBuf,
};
use tracing::{info, Level};
use typemaster::{
    config::{Config, ConfigStore, FileConfigStore},
    corpus::Corpus,
    export::{export_tests_to_path, write_tests_csv},
    stats::{GameResult, StatsDb},
    Difficulty, PartialSubmission, TestSubmission, TmResult, Trainer,
};

/// typing practice with keystroke analytics, speed prediction and personalized feedback
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Scores typing tests, tracks your history and error patterns, predicts where your speed is heading and suggests what to practice next. Results are printed as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// user whose history is read and written (default from config)
    #[arg(global = true, short, long)]
    user: Option<String>,

    /// path of the SQLite stats database (default from config)
    #[arg(global = true, long)]
    db: Option<PathBuf>,

    /// more log output on stderr, repeat for more detail
    #[arg(global = true, short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print a random practice text
    Text {
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,
    },
    /// print random words for the typing game
    Words {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,
    },
    /// show one lesson
    Lesson { id: String },
    /// list all lessons
    Lessons,
    /// score a finished test read as JSON from a file or `-` for stdin
    Submit { input: String },
    /// predict the final speed of a test still in progress (JSON file or `-`)
    Predict { input: String },
    /// show speed and accuracy history with error statistics
    Progress,
    /// record a typing game result
    Game {
        #[arg(long)]
        score: i64,
        #[arg(long, default_value_t = 0)]
        words_typed: i64,
        #[arg(long, default_value_t = 0.0)]
        accuracy: f64,
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,
    },
    /// record an attempt at a lesson
    LessonDone {
        id: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        completed: bool,
    },
    /// ask the typing assistant a question
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// export the test history as CSV (stdout unless an output file is given)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = FileConfigStore::new().load();
    let user = cli.user.clone().unwrap_or_else(|| config.user_id.clone());
    let difficulty = |requested: Option<Difficulty>| requested.unwrap_or(config.default_difficulty);

    match cli.command {
        Command::Text { difficulty: d } => {
            println!("{}", Corpus::load()?.random_text(difficulty(d)));
        }
        Command::Words {
            count,
            difficulty: d,
        } => print_json(&Corpus::load()?.random_words(count, difficulty(d)))?,
        Command::Lesson { ref id } => print_json(&Corpus::load()?.lesson(id))?,
        Command::Lessons => print_json(Corpus::load()?.lessons())?,
        Command::Ask { ref query } => {
            println!("{}", Corpus::load()?.chatbot_reply(&query.join(" ")));
        }
        Command::Submit { ref input } => {
            let submission: TestSubmission = read_json(input)?;
            let mut trainer = open_trainer(&cli, &config)?;
            print_json(&trainer.score_test(&user, &submission)?)?;
        }
        Command::Predict { ref input } => {
            let partial: PartialSubmission = read_json(input)?;
            let trainer = open_trainer(&cli, &config)?;
            print_json(&trainer.predict_mid_test(&user, &partial)?)?;
        }
        Command::Progress => print_json(&open_trainer(&cli, &config)?.progress(&user)?)?,
        Command::Game {
            score,
            words_typed,
            accuracy,
            difficulty: d,
        } => {
            let game = GameResult {
                score,
                words_typed,
                accuracy,
                difficulty: difficulty(d),
            };
            open_trainer(&cli, &config)?.record_game(&user, &game)?;
            print_json(&serde_json::json!({ "status": "success" }))?;
        }
        Command::LessonDone {
            ref id,
            score,
            completed,
        } => {
            let trainer = open_trainer(&cli, &config)?;
            print_json(&trainer.record_lesson(&user, id, score, completed)?)?;
        }
        Command::Export { ref output } => {
            let tests = open_trainer(&cli, &config)?.db().tests(&user)?;
            let rows = match output {
                Some(path) => export_tests_to_path(&tests, path)?,
                None => write_tests_csv(&tests, io::stdout().lock())?,
            };
            info!(rows, "exported test history");
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn open_trainer(cli: &Cli, config: &Config) -> TmResult<Trainer> {
    let db_path = cli.db.clone().unwrap_or_else(|| config.resolved_db_path());
    let db = StatsDb::open(&db_path)?;
    Ok(Trainer::new(db, Corpus::load()?, config.prediction_horizon))
}

fn read_json<T: DeserializeOwned>(source: &str) -> TmResult<T> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(source)?
    };

    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> TmResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
