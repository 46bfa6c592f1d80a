#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ranking clock that measures how long the player spends fighting waves.
//!
//! Timing is gated by the director's `BeginWaveTiming` and `StopWaveTiming`
//! signals; countdowns between waves are not charged. Once `AllWavesCleared`
//! is observed the clock freezes and publishes a [`RankingSummary`].

use std::time::Duration;

use serde::Serialize;
use tracing::info;
use wave_director_core::{Event, Signal};

/// Pure system accumulating timed wave durations.
#[derive(Debug, Default)]
pub struct RankingClock {
    timing: bool,
    current: Duration,
    total: Duration,
    splits: Vec<Duration>,
    summary: Option<RankingSummary>,
}

impl RankingClock {
    /// Creates a stopped clock with no recorded waves.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a wave is currently being timed.
    #[must_use]
    pub const fn is_timing(&self) -> bool {
        self.timing
    }

    /// Total timed duration so far, including the wave in progress.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.total
    }

    /// Durations of every completed wave in order.
    #[must_use]
    pub fn splits(&self) -> &[Duration] {
        &self.splits
    }

    /// Final summary, available once every wave has been cleared.
    #[must_use]
    pub fn summary(&self) -> Option<&RankingSummary> {
        self.summary.as_ref()
    }

    /// Consumes clock events and director signals from one frame.
    ///
    /// Elapsed time is charged before the frame's signals are applied, so a
    /// wave starting this frame is timed from the next one.
    pub fn handle(&mut self, events: &[Event], signals: &[Signal]) {
        if self.summary.is_some() {
            return;
        }

        if self.timing {
            for event in events {
                if let Event::TimeAdvanced { dt } = event {
                    self.current = self.current.saturating_add(*dt);
                    self.total = self.total.saturating_add(*dt);
                }
            }
        }

        for signal in signals {
            self.observe(signal);
        }
    }

    fn observe(&mut self, signal: &Signal) {
        match signal {
            Signal::BeginWaveTiming => {
                self.timing = true;
                self.current = Duration::ZERO;
            }
            Signal::StopWaveTiming => {
                if self.timing {
                    self.splits.push(self.current);
                    self.timing = false;
                }
            }
            Signal::AllWavesCleared => {
                if self.summary.is_none() {
                    let summary = RankingSummary::from_splits(self.total, &self.splits);
                    info!(
                        total_ms = summary.total.as_millis() as u64,
                        waves = summary.waves,
                        "ranking recorded"
                    );
                    self.summary = Some(summary);
                }
            }
            _ => {}
        }
    }
}

/// Aggregated timing for a completed wave set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankingSummary {
    /// Total timed duration across every wave.
    pub total: Duration,
    /// Number of waves timed.
    pub waves: usize,
    /// Shortest single wave.
    pub fastest: Option<Duration>,
    /// Longest single wave.
    pub slowest: Option<Duration>,
    /// Duration of each wave in order.
    pub splits: Vec<Duration>,
}

impl RankingSummary {
    fn from_splits(total: Duration, splits: &[Duration]) -> Self {
        Self {
            total,
            waves: splits.len(),
            fastest: splits.iter().min().copied(),
            slowest: splits.iter().max().copied(),
            splits: splits.to_vec(),
        }
    }
}
