// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable one-line-per-tick output.

use std::io::{self, Write};

use lamina_core::sync::TickReport;

use crate::recorder::TickRecorder;

/// Formats one tick report as a single line.
#[must_use]
pub fn line(report: &TickReport) -> String {
    format!(
        "tick {:>6}  t={:>9.1}ms  cost={:>6.2}ms{}  queue={} dirty={} events={} resolved={}  \
         cache hits={}/{} misses={}",
        report.frame_index,
        report.elapsed_ms,
        report.tick_cost.as_millis_f64(),
        if report.over_budget { " OVER" } else { "" },
        report.queue_tasks_run,
        report.dirty_applied,
        report.events_dispatched,
        report.operations_resolved,
        report.measure.full_hits,
        report.measure.partial_hits,
        report.measure.misses,
    )
}

/// Writes every recorded tick as one line, oldest first.
///
/// # Errors
///
/// Propagates writer failures.
pub fn write_recording(recorder: &TickRecorder, writer: &mut dyn Write) -> io::Result<()> {
    for tick in recorder.ticks() {
        writeln!(writer, "{}", line(&tick.report))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::text::CacheStats;
    use lamina_core::time::{DurationNs, Timestamp};

    #[test]
    fn line_flags_over_budget_ticks() {
        let report = TickReport {
            frame_index: 3,
            elapsed_ms: 50.1,
            tick_cost: DurationNs::from_millis(22),
            over_budget: true,
            queue_tasks_run: 1,
            dirty_applied: 4,
            events_dispatched: 2,
            operations_resolved: 1,
            measure: CacheStats {
                full_hits: 10,
                partial_hits: 2,
                misses: 3,
                invalidations: 0,
            },
        };
        let text = line(&report);
        assert!(text.contains("OVER"));
        assert!(text.contains("dirty=4"));
        assert!(text.contains("hits=10/2"));
    }

    #[test]
    fn recording_writes_one_line_per_tick() {
        let mut rec = TickRecorder::new(8);
        let report = TickReport {
            frame_index: 0,
            elapsed_ms: 0.0,
            tick_cost: DurationNs(0),
            over_budget: false,
            queue_tasks_run: 0,
            dirty_applied: 0,
            events_dispatched: 0,
            operations_resolved: 0,
            measure: CacheStats::default(),
        };
        rec.record(Timestamp(0), report);
        rec.record(Timestamp(16_700_000), report);

        let mut out = Vec::new();
        write_recording(&rec, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
