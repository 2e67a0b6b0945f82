//! The service layer: every operation the front end can ask for, with the
//! analytics pipeline and the store wired together.
use crate::analysis::{
    analyze_errors, analyze_keystrokes, generate_suggestions, predict_current_test,
    predict_future, ErrorAnalysis, ErrorStatistics, FuturePrediction, KeystrokeReport,
};
use crate::corpus::{Corpus, Lesson};
use crate::error::{TmResult, TypemasterError};
use crate::session::{calculate_wpm, Difficulty, PartialSubmission, TestSubmission};
use crate::stats::{GameResult, LessonProgress, StatsDb, TestRecord};
use crate::time_series::{AccuracyPoint, WpmPoint};
use crate::util::{mean, round2};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the user sees after finishing a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub wpm: f64,
    pub accuracy: f64,
    pub error_analysis: ErrorAnalysis,
    pub keystroke_analysis: KeystrokeReport,
    pub prediction: FuturePrediction,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidTestPrediction {
    pub current_wpm: f64,
    pub predicted_wpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub wpm_history: Vec<WpmPoint>,
    pub accuracy_history: Vec<AccuracyPoint>,
    pub error_statistics: ErrorStatistics,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub tests_taken: usize,
}

pub struct Trainer {
    db: StatsDb,
    corpus: Corpus,
    horizon: usize,
}

impl Trainer {
    pub fn new(db: StatsDb, corpus: Corpus, horizon: usize) -> Self {
        Self {
            db,
            corpus,
            horizon,
        }
    }

    pub fn db(&self) -> &StatsDb {
        &self.db
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn random_text(&self, difficulty: Difficulty) -> String {
        self.corpus.random_text(difficulty)
    }

    pub fn random_words(&self, count: usize, difficulty: Difficulty) -> Vec<String> {
        self.corpus.random_words(count, difficulty)
    }

    pub fn lesson(&self, lesson_id: &str) -> Lesson {
        self.corpus.lesson(lesson_id)
    }

    pub fn lessons(&self) -> &[Lesson] {
        self.corpus.lessons()
    }

    pub fn ask(&self, query: &str) -> &str {
        self.corpus.chatbot_reply(query)
    }

    /// Scores a finished test, saves it and builds the user's feedback.
    pub fn score_test(&mut self, user_id: &str, submission: &TestSubmission) -> TmResult<TestReport> {
        let wpm = calculate_wpm(&submission.typed_text, submission.time_taken);
        let error_analysis = analyze_errors(&submission.original_text, &submission.typed_text);
        let keystroke_analysis = analyze_keystrokes(&submission.keystroke_data);

        let record = TestRecord {
            original_text: submission.original_text.clone(),
            typed_text: submission.typed_text.clone(),
            wpm,
            accuracy: error_analysis.accuracy,
            time_taken: submission.time_taken,
            difficulty: submission.difficulty,
            timestamp: Utc::now(),
            error_details: error_analysis.clone(),
            keystroke_data: submission.keystroke_data.clone(),
        };
        let statistics = self
            .db
            .record_test(user_id, &record, |prior| prior.update(&error_analysis))?;

        let history = self.db.wpm_history(user_id)?;
        let prediction = predict_future(&history, self.horizon);
        let suggestions = generate_suggestions(&error_analysis, &keystroke_analysis, &statistics);

        info!(
            user_id,
            wpm,
            accuracy = error_analysis.accuracy,
            tests = history.len(),
            "scored typing test"
        );

        Ok(TestReport {
            wpm,
            accuracy: error_analysis.accuracy,
            error_analysis,
            keystroke_analysis,
            prediction,
            suggestions,
        })
    }

    /// Live estimate of where an unfinished test will end up.
    pub fn predict_mid_test(
        &self,
        user_id: &str,
        partial: &PartialSubmission,
    ) -> TmResult<MidTestPrediction> {
        let current_wpm = calculate_wpm(&partial.partial_text, partial.time_elapsed);
        let history = self.db.wpm_history(user_id)?;
        let predicted_wpm = predict_current_test(current_wpm, &partial.keystroke_data, &history);

        Ok(MidTestPrediction {
            current_wpm,
            predicted_wpm,
        })
    }

    pub fn progress(&self, user_id: &str) -> TmResult<Progress> {
        let wpm_history = self.db.wpm_history(user_id)?;
        let accuracy_history = self.db.accuracy_history(user_id)?;
        let error_statistics = self.db.error_statistics(user_id)?;

        let wpm: Vec<f64> = wpm_history.iter().map(|p| p.wpm).collect();
        let accuracy: Vec<f64> = accuracy_history.iter().map(|p| p.accuracy).collect();

        Ok(Progress {
            average_wpm: mean(&wpm).map(round2).unwrap_or(0.0),
            average_accuracy: mean(&accuracy).map(round2).unwrap_or(0.0),
            tests_taken: wpm_history.len(),
            wpm_history,
            accuracy_history,
            error_statistics,
        })
    }

    pub fn record_game(&self, user_id: &str, game: &GameResult) -> TmResult<()> {
        self.db.record_game(user_id, game)?;
        info!(user_id, score = game.score, "recorded game");
        Ok(())
    }

    /// Records an attempt at a known lesson. Unknown lesson ids are rejected.
    pub fn record_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
        score: f64,
        completed: bool,
    ) -> TmResult<LessonProgress> {
        if !self.corpus.has_lesson(lesson_id) {
            return Err(TypemasterError::InvalidInput(format!(
                "unknown lesson id {lesson_id}"
            )));
        }

        let progress = self
            .db
            .record_lesson_attempt(user_id, lesson_id, score, completed)?;
        info!(user_id, lesson_id, completed = progress.completed, "recorded lesson attempt");
        Ok(progress)
    }

    pub fn lesson_progress(&self, user_id: &str) -> TmResult<Vec<LessonProgress>> {
        self.db.lesson_progress(user_id)
    }
}
