// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded in-memory recording of recent ticks.
//!
//! [`TickRecorder`] keeps the last `capacity` ticks and drops the oldest
//! when full, so it can stay attached to a long-running document without
//! growing. One recorded tick pairs the host frame timestamp with the
//! report the synchronizer produced for it.

use std::collections::VecDeque;

use lamina_core::sync::TickReport;
use lamina_core::time::Timestamp;

/// One recorded tick.
#[derive(Clone, Copy, Debug)]
pub struct RecordedTick {
    /// Host frame timestamp the tick ran for.
    pub frame: Timestamp,
    /// What the tick did.
    pub report: TickReport,
}

/// Fixed-capacity tick recording, oldest dropped first.
#[derive(Debug)]
pub struct TickRecorder {
    ticks: VecDeque<RecordedTick>,
    capacity: usize,
    dropped: u64,
}

impl TickRecorder {
    /// Creates a recorder holding at most `capacity` ticks (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ticks: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Records one tick, evicting the oldest if the recorder is full.
    pub fn record(&mut self, frame: Timestamp, report: TickReport) {
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
            self.dropped += 1;
        }
        self.ticks.push_back(RecordedTick { frame, report });
    }

    /// The recorded ticks, oldest first.
    pub fn ticks(&self) -> impl Iterator<Item = &RecordedTick> {
        self.ticks.iter()
    }

    /// Number of ticks currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether nothing has been recorded (or everything was dropped).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Ticks evicted because the recorder was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discards the recording, keeping the capacity.
    pub fn clear(&mut self) {
        self.ticks.clear();
        self.dropped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::text::CacheStats;
    use lamina_core::time::DurationNs;

    fn report(frame_index: u64) -> TickReport {
        TickReport {
            frame_index,
            elapsed_ms: 16.7,
            tick_cost: DurationNs::from_millis(1),
            over_budget: false,
            queue_tasks_run: 0,
            dirty_applied: 0,
            events_dispatched: 0,
            operations_resolved: 0,
            measure: CacheStats::default(),
        }
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut rec = TickRecorder::new(2);
        rec.record(Timestamp(0), report(0));
        rec.record(Timestamp(1), report(1));
        rec.record(Timestamp(2), report(2));

        assert_eq!(rec.len(), 2);
        assert_eq!(rec.dropped(), 1);
        let indices: Vec<u64> = rec.ticks().map(|t| t.report.frame_index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut rec = TickRecorder::new(0);
        rec.record(Timestamp(0), report(0));
        assert_eq!(rec.len(), 1);
    }
}
