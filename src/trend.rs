//! Bounded proximity history and short-term trend classification.
//!
//! `TrendTracker` keeps the last `capacity` proximity scores for one tracked
//! class and compares the oldest and newest sample of the trailing
//! `trend_window` to decide whether the object is approaching, moving away,
//! or holding still.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::ProximityError;

pub const DEFAULT_HISTORY_CAPACITY: usize = 30;
pub const DEFAULT_TREND_WINDOW: usize = 5;
/// Upper bound on history length; the buffer is allocated up front.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Percent change beyond which the trend is no longer stable.
pub const TREND_THRESHOLD_PERCENT: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximitySample {
    pub score: f64,
    pub at: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    InsufficientData,
    Approaching,
    MovingAway,
    Stable,
}

impl TrendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStatus::InsufficientData => "insufficient_data",
            TrendStatus::Approaching => "approaching",
            TrendStatus::MovingAway => "moving_away",
            TrendStatus::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendReading {
    pub label: String,
    pub status: TrendStatus,
    pub change_percent: Option<f64>,
}

impl TrendReading {
    fn insufficient() -> Self {
        Self {
            label: "analyzing...".to_string(),
            status: TrendStatus::InsufficientData,
            change_percent: None,
        }
    }

    fn from_change(change_percent: f64) -> Self {
        let (status, label) = if change_percent > TREND_THRESHOLD_PERCENT {
            (
                TrendStatus::Approaching,
                format!("approaching (+{:.1}%)", change_percent),
            )
        } else if change_percent < -TREND_THRESHOLD_PERCENT {
            (
                TrendStatus::MovingAway,
                format!("moving away ({:.1}%)", change_percent),
            )
        } else {
            (
                TrendStatus::Stable,
                format!("stable (change: {:.1}%)", change_percent),
            )
        };
        Self {
            label,
            status,
            change_percent: Some(change_percent),
        }
    }
}

/// Proximity history for one tracked class.
#[derive(Clone, Debug)]
pub struct TrendTracker {
    history: VecDeque<ProximitySample>,
    capacity: usize,
    trend_window: usize,
    last_detection: Option<Instant>,
}

impl TrendTracker {
    /// Tracker with the default 30-sample history and 5-sample window.
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
            trend_window: DEFAULT_TREND_WINDOW,
            last_detection: None,
        }
    }

    /// Requires `2 <= trend_window <= capacity <= MAX_HISTORY_CAPACITY`.
    pub fn with_window(capacity: usize, trend_window: usize) -> Result<Self, ProximityError> {
        if trend_window < 2 || trend_window > capacity || capacity > MAX_HISTORY_CAPACITY {
            return Err(ProximityError::InvalidWindow {
                capacity,
                trend_window,
                max: MAX_HISTORY_CAPACITY,
            });
        }
        Ok(Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            trend_window,
            last_detection: None,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn trend_window(&self) -> usize {
        self.trend_window
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Samples oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ProximitySample> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&ProximitySample> {
        self.history.back()
    }

    pub fn last_detection(&self) -> Option<Instant> {
        self.last_detection
    }

    /// Record a score, evicting the oldest sample once full.
    ///
    /// Rejected scores leave the tracker untouched.
    pub fn append(&mut self, score: f64, at: Instant) -> Result<(), ProximityError> {
        if !score.is_finite() || score < 0.0 {
            return Err(ProximityError::InvalidScore(score));
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(ProximitySample { score, at });
        self.last_detection = Some(at);
        Ok(())
    }

    pub fn classify(&self) -> TrendReading {
        let len = self.history.len();
        if len < self.trend_window {
            return TrendReading::insufficient();
        }

        let first = self.history[len - self.trend_window].score;
        let last = self.history[len - 1].score;
        let change_percent = if first > 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        };
        TrendReading::from_change(change_percent)
    }

    /// Time since the class was last seen; `None` if it never was.
    pub fn time_since_last_detection(&self, now: Instant) -> Option<Duration> {
        self.last_detection
            .map(|seen| now.saturating_duration_since(seen))
    }
}

impl Default for TrendTracker {
    fn default() -> Self {
        Self::new()
    }
}
