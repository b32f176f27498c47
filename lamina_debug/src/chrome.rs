// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes a [`TickRecorder`](crate::recorder::TickRecorder)'s
//! contents as [Chrome Trace Event Format][spec] JSON, suitable for loading
//! into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
//!
//! Each tick becomes one complete ("X") event spanning its wall cost, with
//! the report counters as args. Over-budget ticks additionally emit a
//! global instant event so dropped frames stand out on the timeline.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::TickRecorder;

/// Exports a recording as Chrome Trace Event Format JSON.
///
/// Timestamps are the host frame timestamps converted to microseconds.
///
/// # Errors
///
/// Propagates writer failures.
pub fn export(recorder: &TickRecorder, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for tick in recorder.ticks() {
        let report = tick.report;
        events.push(json!({
            "ph": "X",
            "name": "Tick",
            "cat": "Sync",
            "ts": nanos_to_us(tick.frame.nanos()),
            "dur": nanos_to_us(report.tick_cost.nanos()),
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": report.frame_index,
                "elapsed_ms": report.elapsed_ms,
                "queue_tasks_run": report.queue_tasks_run,
                "dirty_applied": report.dirty_applied,
                "events_dispatched": report.events_dispatched,
                "operations_resolved": report.operations_resolved,
                "measure_full_hits": report.measure.full_hits,
                "measure_partial_hits": report.measure.partial_hits,
                "measure_misses": report.measure.misses,
            }
        }));
        if report.over_budget {
            events.push(json!({
                "ph": "i",
                "name": "DroppedFrame",
                "cat": "Sync",
                "ts": nanos_to_us(tick.frame.nanos()),
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "frame_index": report.frame_index,
                    "cost_ms": report.tick_cost.as_millis_f64(),
                }
            }));
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::sync::TickReport;
    use lamina_core::text::CacheStats;
    use lamina_core::time::{DurationNs, Timestamp};

    fn report(frame_index: u64, over_budget: bool) -> TickReport {
        TickReport {
            frame_index,
            elapsed_ms: 16.7,
            tick_cost: DurationNs::from_millis(if over_budget { 25 } else { 2 }),
            over_budget,
            queue_tasks_run: 1,
            dirty_applied: 2,
            events_dispatched: 0,
            operations_resolved: 0,
            measure: CacheStats::default(),
        }
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = TickRecorder::new(8);
        rec.record(Timestamp(16_700_000), report(0, false));
        rec.record(Timestamp(33_400_000), report(1, true));

        let mut out = Vec::new();
        export(&rec, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();

        // Two ticks plus one dropped-frame instant.
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["ph"], "X");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["name"], "DroppedFrame");
    }

    #[test]
    fn export_empty_recording() {
        let rec = TickRecorder::new(4);
        let mut out = Vec::new();
        export(&rec, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
