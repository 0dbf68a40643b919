// Tick latency instrumentation
//
// network (tick_start) -> processing (processing_start..processing_end) -> render (render_start..render_end)

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Timing marks captured by the pipeline for one published tick
#[derive(Debug, Clone, Copy)]
pub struct TickTiming {
    pub tick_start: Instant,
    pub processing_start: Instant,
    pub processing_end: Instant,
}

impl TickTiming {
    /// Time between the bytes arriving and parsing starting
    pub fn data_processing_latency(&self) -> Duration {
        self.processing_start.saturating_duration_since(self.tick_start)
    }

    /// Time spent building the snapshot
    pub fn parse_latency(&self) -> Duration {
        self.processing_end.saturating_duration_since(self.processing_start)
    }

    /// Mark the start of the consumer applying this tick
    pub fn begin_render(self) -> RenderTimer {
        RenderTimer {
            timing: self,
            render_start: Instant::now(),
        }
    }
}

/// Open render stage; `finish` closes it
#[derive(Debug)]
pub struct RenderTimer {
    timing: TickTiming,
    render_start: Instant,
}

impl RenderTimer {
    pub fn finish(self) -> LatencyRecord {
        let render_end = Instant::now();
        LatencyRecord {
            data_processing_latency: self.timing.data_processing_latency(),
            parse_latency: self.timing.parse_latency(),
            ui_update_latency: render_end.saturating_duration_since(self.render_start),
            end_to_end_latency: render_end.saturating_duration_since(self.timing.tick_start),
        }
    }
}

/// Per-tick latency breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyRecord {
    pub data_processing_latency: Duration,
    pub parse_latency: Duration,
    pub ui_update_latency: Duration,
    pub end_to_end_latency: Duration,
}

/// Aggregates over the most recent latency samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub mean_processing: Duration,
    pub mean_ui_update: Duration,
    pub mean_end_to_end: Duration,
    pub max_end_to_end: Duration,
    pub p50_end_to_end: Duration,
    pub p99_end_to_end: Duration,
}

/// Rolling window of latency records
#[derive(Debug, Clone)]
pub struct LatencyStats {
    window: VecDeque<LatencyRecord>,
    capacity: usize,
    total_recorded: u64,
}

impl LatencyStats {
    pub const DEFAULT_WINDOW: usize = 100;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total_recorded: 0,
        }
    }

    pub fn record(&mut self, record: LatencyRecord) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(record);
        self.total_recorded += 1;
    }

    pub fn latest(&self) -> Option<&LatencyRecord> {
        self.window.back()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn summary(&self) -> LatencySummary {
        if self.window.is_empty() {
            return LatencySummary::default();
        }

        let n = self.window.len();
        let mean = |f: fn(&LatencyRecord) -> Duration| -> Duration {
            self.window.iter().map(f).sum::<Duration>() / n as u32
        };

        let mut end_to_end: Vec<Duration> = self.window.iter().map(|r| r.end_to_end_latency).collect();
        end_to_end.sort_unstable();

        LatencySummary {
            samples: n,
            mean_processing: mean(|r| r.data_processing_latency),
            mean_ui_update: mean(|r| r.ui_update_latency),
            mean_end_to_end: mean(|r| r.end_to_end_latency),
            max_end_to_end: end_to_end[n - 1],
            p50_end_to_end: percentile(&end_to_end, 0.50),
            p99_end_to_end: percentile(&end_to_end, 0.99),
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

/// Nearest-rank percentile over an ascending, non-empty slice
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
