use assert_matches::assert_matches;
use typemaster::analysis::{KeystrokeReport, PredictionStatus};
use typemaster::corpus::Corpus;
use typemaster::stats::StatsDb;
use typemaster::{Difficulty, KeystrokeEvent, TestSubmission, Trainer};

fn trainer_with(db: StatsDb) -> Trainer {
    Trainer::new(db, Corpus::load().unwrap(), 5)
}

fn submission(original: &str, typed: &str, seconds: f64) -> TestSubmission {
    TestSubmission {
        original_text: original.to_string(),
        typed_text: typed.to_string(),
        time_taken: seconds,
        keystroke_data: Vec::new(),
        difficulty: Difficulty::Medium,
    }
}

#[test]
fn cat_sat_scenario_end_to_end() {
    let mut trainer = trainer_with(StatsDb::in_memory().unwrap());
    let report = trainer
        .score_test("alice", &submission("the cat sat", "the cat sit", 6.0))
        .unwrap();

    assert_eq!(report.wpm, 22.0);
    assert_eq!(report.accuracy, 90.91);
    assert_eq!(report.error_analysis.word_errors.len(), 1);
    assert_eq!(report.error_analysis.word_errors[0].original, "sat");
    assert_eq!(report.error_analysis.word_errors[0].typed, "sit");
    assert_eq!(report.error_analysis.word_errors[0].position, 2);
    assert_eq!(report.error_analysis.character_errors.get("a->i"), Some(1));
    assert_eq!(report.error_analysis.character_errors.len(), 1);
}

#[test]
fn report_json_shape() {
    let mut trainer = trainer_with(StatsDb::in_memory().unwrap());
    let report = trainer
        .score_test("alice", &submission("hello", "hello", 3.0))
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["keystroke_analysis"]["status"], "insufficient_data");
    assert_eq!(json["prediction"]["status"], "simple_prediction");
    assert!(json["error_analysis"]["character_errors"].is_object());
    assert!(json["suggestions"].as_array().unwrap().len() >= 2);
}

#[test]
fn trend_prediction_after_steady_improvement() {
    let mut trainer = trainer_with(StatsDb::in_memory().unwrap());
    let text = "abcdefghij";

    // 10 characters is two words, so these are 30, 32 and 34 WPM
    for seconds in [4.0, 3.75, 60.0 / 17.0] {
        trainer
            .score_test("bob", &submission(text, text, seconds))
            .unwrap();
    }

    let progress = trainer.progress("bob").unwrap();
    let wpm: Vec<f64> = progress.wpm_history.iter().map(|p| p.wpm).collect();
    assert_eq!(wpm, vec![30.0, 32.0, 34.0]);

    let report = trainer
        .score_test("bob", &submission(text, text, 60.0 / 18.0))
        .unwrap();
    assert_eq!(report.prediction.status, PredictionStatus::Success);
    assert_eq!(report.prediction.current_avg, 33.0);
    // slope 2 from 30, five tests past the fourth
    assert_eq!(report.prediction.predicted, 46.0);
}

#[test]
fn keystroke_trace_with_pause() {
    let mut trainer = trainer_with(StatsDb::in_memory().unwrap());
    let mut trace: Vec<KeystrokeEvent> = (0..15)
        .map(|i| KeystrokeEvent::new(1_000.0 + i as f64 * 200.0, "e"))
        .collect();
    trace.push(KeystrokeEvent::new(60_000.0, "e"));

    let mut sub = submission("see the tree", "see the tree", 5.0);
    sub.keystroke_data = trace;
    let report = trainer.score_test("carol", &sub).unwrap();

    assert_matches!(report.keystroke_analysis, KeystrokeReport::Analysed(ref analysis) => {
        assert_eq!(analysis.avg_interval, 200.0);
        assert_eq!(analysis.rhythm_consistency, 100.0);
        assert_eq!(analysis.total_keystrokes, 16);
    });
}

#[test]
fn history_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.db");

    {
        let mut trainer = trainer_with(StatsDb::open(&path).unwrap());
        trainer
            .score_test("dave", &submission("quick fox", "quikc fox", 4.0))
            .unwrap();
        trainer.record_lesson("dave", "1", 70.0, false).unwrap();
    }

    let trainer = trainer_with(StatsDb::open(&path).unwrap());
    let progress = trainer.progress("dave").unwrap();
    assert_eq!(progress.tests_taken, 1);
    assert!(!progress.error_statistics.character_errors.is_empty());

    let lessons = trainer.lesson_progress("dave").unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].attempts, 1);
}

#[test]
fn lesson_progress_is_monotonic() {
    let trainer = trainer_with(StatsDb::in_memory().unwrap());
    let scores = [55.0, 90.0, 40.0, 85.0];
    let mut best = 0.0_f64;

    for (i, score) in scores.iter().enumerate() {
        let progress = trainer
            .record_lesson("erin", "4", *score, i == 1)
            .unwrap();
        best = best.max(*score);

        assert_eq!(progress.attempts as usize, i + 1);
        assert_eq!(progress.best_score, best);
        assert_eq!(progress.completed, i >= 1);
    }
}

#[test]
fn game_results_are_recorded_per_user() {
    let trainer = trainer_with(StatsDb::in_memory().unwrap());
    let game = typemaster::stats::GameResult {
        score: 300,
        words_typed: 25,
        accuracy: 96.0,
        difficulty: Difficulty::Easy,
    };
    trainer.record_game("frank", &game).unwrap();

    assert_eq!(trainer.db().game_results("frank").unwrap().len(), 1);
    assert!(trainer.db().game_results("grace").unwrap().is_empty());
}
