use crate::session::KeystrokeEvent;
use crate::util::{mean, round2, std_dev};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fewer events than this cannot be analysed.
pub const MIN_EVENTS: usize = 10;
/// Gaps at or above this many milliseconds are breaks, not typing.
pub const PAUSE_THRESHOLD_MS: f64 = 5000.0;

const SLOW_KEY_FACTOR: f64 = 1.5;
const SLOW_KEY_MIN_SAMPLES: usize = 3;
const SLOW_KEY_LIMIT: usize = 5;
const RHYTHM_MIN_INTERVALS: usize = 5;
const NEUTRAL_RHYTHM: f64 = 50.0;
const FATIGUE_MIN_INTERVALS: usize = 20;
const FATIGUE_FACTOR: f64 = 1.3;
const MAX_SMOOTHING_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeAnalysis {
    /// Mean gap between keystrokes in milliseconds.
    pub avg_interval: f64,
    /// 0-100, higher is steadier.
    pub rhythm_consistency: f64,
    pub slow_keys: Vec<String>,
    pub fatigue_detected: bool,
    /// Fraction of the test (0-1) at which slowing down set in.
    pub fatigue_point: Option<f64>,
    pub total_keystrokes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeystrokeReport {
    InsufficientData,
    #[serde(rename = "success")]
    Analysed(KeystrokeAnalysis),
}

impl KeystrokeReport {
    pub fn analysis(&self) -> Option<&KeystrokeAnalysis> {
        match self {
            KeystrokeReport::Analysed(analysis) => Some(analysis),
            KeystrokeReport::InsufficientData => None,
        }
    }

    pub fn slow_keys(&self) -> &[String] {
        self.analysis()
            .map(|a| a.slow_keys.as_slice())
            .unwrap_or_default()
    }
}

/// Typing intervals grouped by the key that ended them, in first-seen order.
#[derive(Debug, Default)]
struct KeyIntervals {
    order: Vec<String>,
    samples: HashMap<String, Vec<f64>>,
}

impl KeyIntervals {
    fn push(&mut self, key: &str, interval: f64) {
        match self.samples.get_mut(key) {
            Some(samples) => samples.push(interval),
            None => {
                self.order.push(key.to_string());
                self.samples.insert(key.to_string(), vec![interval]);
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.order
            .iter()
            .filter_map(|key| self.samples.get(key).map(|s| (key.as_str(), s.as_slice())))
    }
}

/// Derives typing rhythm, slow keys and fatigue from a keystroke trace.
pub fn analyze_keystrokes(trace: &[KeystrokeEvent]) -> KeystrokeReport {
    if trace.len() < MIN_EVENTS {
        return KeystrokeReport::InsufficientData;
    }

    let mut intervals = Vec::with_capacity(trace.len());
    let mut key_intervals = KeyIntervals::default();

    for pair in trace.windows(2) {
        let (Some(prev), Some(curr)) = (pair[0].time(), pair[1].time()) else {
            continue;
        };
        let interval = curr - prev;
        if interval >= PAUSE_THRESHOLD_MS {
            continue;
        }
        intervals.push(interval);
        if !pair[1].key.is_empty() {
            key_intervals.push(&pair[1].key, interval);
        }
    }

    let avg_interval = mean(&intervals).unwrap_or(0.0);
    let (fatigue_detected, fatigue_point) = detect_fatigue(&intervals);

    KeystrokeReport::Analysed(KeystrokeAnalysis {
        avg_interval: round2(avg_interval),
        rhythm_consistency: round2(rhythm_consistency(&intervals)),
        slow_keys: slow_keys(&key_intervals, avg_interval),
        fatigue_detected,
        fatigue_point,
        total_keystrokes: trace.len(),
    })
}

fn slow_keys(key_intervals: &KeyIntervals, avg_interval: f64) -> Vec<String> {
    key_intervals
        .iter()
        .filter(|(_, samples)| samples.len() >= SLOW_KEY_MIN_SAMPLES)
        .filter(|(_, samples)| {
            mean(samples).is_some_and(|key_avg| key_avg > avg_interval * SLOW_KEY_FACTOR)
        })
        .map(|(key, _)| key.to_string())
        .take(SLOW_KEY_LIMIT)
        .collect()
}

/// 100 minus half the coefficient of variation (in percent), clamped to 0-100.
pub fn rhythm_consistency(intervals: &[f64]) -> f64 {
    if intervals.len() < RHYTHM_MIN_INTERVALS {
        return NEUTRAL_RHYTHM;
    }

    let (Some(avg), Some(sd)) = (mean(intervals), std_dev(intervals)) else {
        return NEUTRAL_RHYTHM;
    };
    let cv = if avg > 0.0 { sd / avg } else { 1.0 };

    (100.0 - cv * 50.0).clamp(0.0, 100.0)
}

/// Compares the smoothed first and last quarters of the test; a last quarter
/// 30% slower than the first means fatigue.
pub fn detect_fatigue(intervals: &[f64]) -> (bool, Option<f64>) {
    if intervals.len() < FATIGUE_MIN_INTERVALS {
        return (false, None);
    }

    let window = MAX_SMOOTHING_WINDOW.min(intervals.len() / 5);
    let smoothed: Vec<f64> = intervals
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect();
    let n = smoothed.len();

    let first_quarter = &smoothed[..n / 4];
    let last_quarter = &smoothed[n - n.div_ceil(4)..];
    let (Some(first_avg), Some(last_avg)) = (mean(first_quarter), mean(last_quarter)) else {
        return (false, None);
    };

    let threshold = first_avg * FATIGUE_FACTOR;
    if last_avg <= threshold {
        return (false, None);
    }

    let onset = (n / 2..n)
        .find(|&i| smoothed[i] > threshold)
        .map(|i| i as f64 / n as f64);

    (true, onset)
}
