use crate::analysis::{ErrorAnalysis, ErrorStatistics};
use crate::error::TmResult;
use crate::session::{Difficulty, KeystrokeEvent};
use crate::time_series::{AccuracyPoint, WpmPoint};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A scored typing test ready to be persisted.
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub original_text: String,
    pub typed_text: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub time_taken: f64,
    pub difficulty: Difficulty,
    pub timestamp: DateTime<Utc>,
    pub error_details: ErrorAnalysis,
    pub keystroke_data: Vec<KeystrokeEvent>,
}

/// The flat view of a stored test used for listings and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTest {
    pub id: i64,
    pub timestamp: String,
    pub difficulty: Difficulty,
    pub wpm: f64,
    pub accuracy: f64,
    pub time_taken: f64,
    pub error_count: usize,
    pub original_text: String,
    pub typed_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub words_typed: i64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub completed: bool,
    pub attempts: u32,
    pub best_score: f64,
}

/// Durable per-user store for tests, games, lessons and error statistics
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Open (or create) the database file, creating parent directories as needed
    pub fn open<P: AsRef<Path>>(path: P) -> TmResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(path = %path.display(), "opening stats database");
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> TmResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> TmResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                error_statistics TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS typing_tests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES user_profiles(user_id),
                original_text TEXT NOT NULL,
                typed_text TEXT NOT NULL,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                time_taken REAL NOT NULL,
                difficulty TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                error_details TEXT NOT NULL,
                keystroke_data TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES user_profiles(user_id),
                score INTEGER NOT NULL,
                words_typed INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                difficulty TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lesson_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES user_profiles(user_id),
                lesson_id TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                attempts INTEGER NOT NULL DEFAULT 0,
                best_score REAL NOT NULL DEFAULT 0,
                UNIQUE(user_id, lesson_id)
            );

            CREATE INDEX IF NOT EXISTS idx_typing_tests_user_time
                ON typing_tests(user_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_game_results_user
                ON game_results(user_id);
            "#,
        )?;

        Ok(StatsDb { conn })
    }

    /// The user's lifetime error statistics; empty for unknown users
    pub fn error_statistics(&self, user_id: &str) -> TmResult<ErrorStatistics> {
        read_error_statistics(&self.conn, user_id)
    }

    /// Store a test and fold its errors into the user's statistics atomically.
    ///
    /// The read of the prior statistics, the update and both writes happen in
    /// one immediate transaction so concurrent submissions cannot lose counts.
    pub fn record_test<F>(
        &mut self,
        user_id: &str,
        record: &TestRecord,
        update: F,
    ) -> TmResult<ErrorStatistics>
    where
        F: FnOnce(ErrorStatistics) -> ErrorStatistics,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_profile(&tx, user_id)?;
        let statistics = update(read_error_statistics(&tx, user_id)?);

        tx.execute(
            "UPDATE user_profiles SET error_statistics = ?1 WHERE user_id = ?2",
            params![serde_json::to_string(&statistics)?, user_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO typing_tests
            (user_id, original_text, typed_text, wpm, accuracy, time_taken, difficulty,
             timestamp, error_details, keystroke_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                user_id,
                record.original_text,
                record.typed_text,
                record.wpm,
                record.accuracy,
                record.time_taken,
                record.difficulty.to_string(),
                format_timestamp(&record.timestamp),
                serde_json::to_string(&record.error_details)?,
                serde_json::to_string(&record.keystroke_data)?,
            ],
        )?;
        let test_id = tx.last_insert_rowid();

        tx.commit()?;
        debug!(user_id, test_id, wpm = record.wpm, "saved typing test");

        Ok(statistics)
    }

    /// WPM of every test the user has taken, oldest first
    pub fn wpm_history(&self, user_id: &str) -> TmResult<Vec<WpmPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, wpm FROM typing_tests WHERE user_id = ?1 ORDER BY timestamp, id",
        )?;

        let points = stmt
            .query_map([user_id], |row| Ok(WpmPoint::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(points)
    }

    pub fn accuracy_history(&self, user_id: &str) -> TmResult<Vec<AccuracyPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, accuracy FROM typing_tests WHERE user_id = ?1 ORDER BY timestamp, id",
        )?;

        let points = stmt
            .query_map([user_id], |row| {
                Ok(AccuracyPoint::new(row.get::<_, String>(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(points)
    }

    pub fn tests(&self, user_id: &str) -> TmResult<Vec<StoredTest>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, timestamp, difficulty, wpm, accuracy, time_taken, error_details,
                   original_text, typed_text
            FROM typing_tests
            WHERE user_id = ?1
            ORDER BY timestamp, id
            "#,
        )?;

        let tests = stmt
            .query_map([user_id], |row| {
                let details: String = row.get(6)?;
                let error_count = serde_json::from_str::<ErrorAnalysis>(&details)
                    .map(|analysis| analysis.error_count)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
                    })?;

                Ok(StoredTest {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    difficulty: difficulty_column(row, 2)?,
                    wpm: row.get(3)?,
                    accuracy: row.get(4)?,
                    time_taken: row.get(5)?,
                    error_count,
                    original_text: row.get(7)?,
                    typed_text: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tests)
    }

    pub fn record_game(&self, user_id: &str, game: &GameResult) -> TmResult<()> {
        ensure_profile(&self.conn, user_id)?;
        self.conn.execute(
            r#"
            INSERT INTO game_results (user_id, score, words_typed, accuracy, difficulty, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                game.score,
                game.words_typed,
                game.accuracy,
                game.difficulty.to_string(),
                format_timestamp(&Utc::now()),
            ],
        )?;

        debug!(user_id, score = game.score, "saved game result");
        Ok(())
    }

    pub fn game_results(&self, user_id: &str) -> TmResult<Vec<GameResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT score, words_typed, accuracy, difficulty
            FROM game_results
            WHERE user_id = ?1
            ORDER BY timestamp, id
            "#,
        )?;

        let games = stmt
            .query_map([user_id], |row| {
                Ok(GameResult {
                    score: row.get(0)?,
                    words_typed: row.get(1)?,
                    accuracy: row.get(2)?,
                    difficulty: difficulty_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    /// Count one attempt at a lesson. Completion is sticky and the best score
    /// starts at 0 and only rises.
    pub fn record_lesson_attempt(
        &self,
        user_id: &str,
        lesson_id: &str,
        score: f64,
        completed: bool,
    ) -> TmResult<LessonProgress> {
        ensure_profile(&self.conn, user_id)?;
        self.conn.execute(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, attempts, best_score)
            VALUES (?1, ?2, ?3, 1, MAX(?4, 0.0))
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                attempts = attempts + 1,
                completed = MAX(completed, excluded.completed),
                best_score = MAX(best_score, excluded.best_score)
            "#,
            params![user_id, lesson_id, completed, score],
        )?;

        let progress = self.conn.query_row(
            r#"
            SELECT lesson_id, completed, attempts, best_score
            FROM lesson_progress
            WHERE user_id = ?1 AND lesson_id = ?2
            "#,
            params![user_id, lesson_id],
            lesson_progress_row,
        )?;

        debug!(user_id, lesson_id, attempts = progress.attempts, "saved lesson attempt");
        Ok(progress)
    }

    pub fn lesson_progress(&self, user_id: &str) -> TmResult<Vec<LessonProgress>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT lesson_id, completed, attempts, best_score
            FROM lesson_progress
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )?;

        let progress = stmt
            .query_map([user_id], lesson_progress_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(progress)
    }
}

/// Fixed-width UTC so that text order is time order.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ensure_profile(conn: &Connection, user_id: &str) -> TmResult<()> {
    let created = conn.execute(
        "INSERT OR IGNORE INTO user_profiles (user_id, error_statistics, created_at) VALUES (?1, '{}', ?2)",
        params![user_id, format_timestamp(&Utc::now())],
    )?;

    if created > 0 {
        debug!(user_id, "created user profile");
    }
    Ok(())
}

fn read_error_statistics(conn: &Connection, user_id: &str) -> TmResult<ErrorStatistics> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT error_statistics FROM user_profiles WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(ErrorStatistics::default()),
    }
}

fn difficulty_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Difficulty> {
    let raw: String = row.get(index)?;
    <Difficulty as ValueEnum>::from_str(&raw, true)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into()))
}

fn lesson_progress_row(row: &Row<'_>) -> rusqlite::Result<LessonProgress> {
    Ok(LessonProgress {
        lesson_id: row.get(0)?,
        completed: row.get(1)?,
        attempts: row.get(2)?,
        best_score: row.get(3)?,
    })
}
