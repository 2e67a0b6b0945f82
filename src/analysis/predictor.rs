use crate::session::KeystrokeEvent;
use crate::time_series::{wpm_values, WpmPoint};
use crate::util::{mean, round2, std_dev};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_HORIZON: usize = 5;

const RECENT_WINDOW: usize = 5;
const MIN_TREND_POINTS: usize = 3;
const FULL_CONFIDENCE_POINTS: f64 = 10.0;
const NEUTRAL_CONFIDENCE: f64 = 0.5;
const MIN_PACE_EVENTS: usize = 10;
const MAX_PACE_FACTOR: f64 = 1.5;
const CURRENT_PACE_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Success,
    SimplePrediction,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturePrediction {
    pub status: PredictionStatus,
    /// Mean of the most recent tests.
    pub current_avg: f64,
    pub predicted: f64,
    /// Percent change from `current_avg` to `predicted`.
    pub improvement: f64,
    /// 0-1.
    pub confidence: f64,
}

impl FuturePrediction {
    fn insufficient() -> Self {
        Self {
            status: PredictionStatus::InsufficientData,
            current_avg: 0.0,
            predicted: 0.0,
            improvement: 0.0,
            confidence: 0.0,
        }
    }

    fn simple(current_avg: f64) -> Self {
        Self {
            status: PredictionStatus::SimplePrediction,
            current_avg: round2(current_avg),
            predicted: round2(current_avg),
            improvement: 0.0,
            confidence: NEUTRAL_CONFIDENCE,
        }
    }
}

/// Least-squares line through `(index, value)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Returns `None` when the series is too short or the fit is not finite.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = mean(values)?;

        let (covariance, variance) = values.iter().enumerate().fold(
            (0.0, 0.0),
            |(cov, var), (i, y)| {
                let dx = i as f64 - x_mean;
                (cov + dx * (y - y_mean), var + dx * dx)
            },
        );

        let slope = covariance / variance;
        let intercept = y_mean - slope * x_mean;
        (slope.is_finite() && intercept.is_finite()).then_some(Self { slope, intercept })
    }

    pub fn at(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Extrapolates the user's WPM `horizon` tests into the future.
pub fn predict_future(history: &[WpmPoint], horizon: usize) -> FuturePrediction {
    if history.is_empty() {
        return FuturePrediction::insufficient();
    }

    let values = wpm_values(history);
    let recent = &values[values.len().saturating_sub(RECENT_WINDOW)..];
    let current_avg = mean(recent).unwrap_or(0.0);

    if values.len() < MIN_TREND_POINTS {
        return FuturePrediction::simple(current_avg);
    }

    let Some(trend) = LinearTrend::fit(&values) else {
        warn!(
            points = values.len(),
            "WPM trend fit failed, using simple average"
        );
        return FuturePrediction::simple(current_avg);
    };

    let target = (values.len() + horizon).saturating_sub(1) as f64;
    let predicted = trend.at(target);
    let improvement = if current_avg > 0.0 {
        (predicted - current_avg) / current_avg * 100.0
    } else {
        0.0
    };

    FuturePrediction {
        status: PredictionStatus::Success,
        current_avg: round2(current_avg),
        predicted: round2(predicted),
        improvement: round2(improvement),
        confidence: confidence(&values),
    }
}

/// Weighs how much history there is against how consistent it is.
fn confidence(values: &[f64]) -> f64 {
    let volume = (values.len() as f64 / FULL_CONFIDENCE_POINTS).min(1.0);

    let consistency = if values.len() < MIN_TREND_POINTS {
        NEUTRAL_CONFIDENCE
    } else {
        match (mean(values), std_dev(values)) {
            (Some(avg), Some(sd)) if avg != 0.0 => 1.0 - (sd / avg).min(1.0),
            _ => NEUTRAL_CONFIDENCE,
        }
    };

    round2(0.7 * volume + 0.3 * consistency)
}

/// Estimates where the current test will finish from its pace so far.
///
/// A test that is speeding up (longer gaps in the first half than in the
/// second) scales the current WPM up by at most 1.5x; a slowing test is left
/// as is. With three or more past tests the result is blended 70/30 with the
/// historical mean.
pub fn predict_current_test(
    current_wpm: f64,
    trace: &[KeystrokeEvent],
    history: &[WpmPoint],
) -> f64 {
    let mut predicted = current_wpm;

    if trace.len() > MIN_PACE_EVENTS {
        if let Some(factor) = pace_factor(trace) {
            predicted *= factor;
        }
    }

    if history.len() >= MIN_TREND_POINTS {
        if let Some(historical_avg) = mean(&wpm_values(history)) {
            predicted =
                CURRENT_PACE_WEIGHT * predicted + (1.0 - CURRENT_PACE_WEIGHT) * historical_avg;
        }
    }

    round2(predicted)
}

fn pace_factor(trace: &[KeystrokeEvent]) -> Option<f64> {
    let timestamps: Vec<f64> = trace.iter().filter_map(KeystrokeEvent::time).collect();
    if timestamps.len() < MIN_PACE_EVENTS {
        return None;
    }

    let (first_half, second_half) = timestamps.split_at(timestamps.len() / 2);
    let first = mean_gap(first_half)?;
    let second = mean_gap(second_half)?;
    if first <= 0.0 || second <= 0.0 {
        return None;
    }

    Some((first / second).clamp(1.0, MAX_PACE_FACTOR))
}

fn mean_gap(timestamps: &[f64]) -> Option<f64> {
    let gaps: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    mean(&gaps)
}
