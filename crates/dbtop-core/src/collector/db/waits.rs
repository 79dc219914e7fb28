//! Counters synthesized from sampled wait events.
//!
//! PostgreSQL has no cumulative wait-event view, only the current wait of each backend.
//! [`WaitSampler`] turns those samples into monotonic counters: every session seen waiting
//! adds one to `waits` and the time since the previous sample to `time_ms`.

use std::collections::HashMap;

use crate::model::WaitEventRow;

#[derive(Debug, Default)]
pub struct WaitSampler {
    totals: HashMap<String, WaitEventRow>,
    last_sample_ms: Option<i64>,
}

impl WaitSampler {
    /// Adds one sample of (event, class, waiting sessions) and returns all totals,
    /// largest accumulated time first.
    pub fn accumulate(&mut self, sample: Vec<(String, String, u64)>, now_ms: i64) -> Vec<WaitEventRow> {
        let elapsed_ms = self
            .last_sample_ms
            .map(|last| (now_ms - last).max(0) as f64)
            .unwrap_or(0.0);
        self.last_sample_ms = Some(now_ms);

        for (event, class, sessions) in sample {
            let entry = self
                .totals
                .entry(event.clone())
                .or_insert_with(|| WaitEventRow {
                    event,
                    class,
                    waits: 0,
                    time_ms: 0.0,
                });
            entry.waits = entry.waits.saturating_add(sessions);
            entry.time_ms += sessions as f64 * elapsed_ms;
        }

        let mut rows: Vec<WaitEventRow> = self.totals.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.time_ms
                .total_cmp(&a.time_ms)
                .then_with(|| b.waits.cmp(&a.waits))
                .then_with(|| a.event.cmp(&b.event))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(items: &[(&str, u64)]) -> Vec<(String, String, u64)> {
        items
            .iter()
            .map(|(e, n)| (e.to_string(), "IO".to_string(), *n))
            .collect()
    }

    #[test]
    fn totals_only_grow() {
        let mut sampler = WaitSampler::default();
        sampler.accumulate(sample(&[("DataFileRead", 3)]), 0);
        let rows = sampler.accumulate(sample(&[("WALWrite", 1)]), 1_000);

        let read = rows.iter().find(|r| r.event == "DataFileRead").unwrap();
        assert_eq!(read.waits, 3);
        let wal = rows.iter().find(|r| r.event == "WALWrite").unwrap();
        assert_eq!(wal.waits, 1);
        assert!((wal.time_ms - 1_000.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].event, "WALWrite");
    }

    #[test]
    fn clock_going_backwards_adds_no_time() {
        let mut sampler = WaitSampler::default();
        sampler.accumulate(sample(&[("Lock", 1)]), 5_000);
        let rows = sampler.accumulate(sample(&[("Lock", 1)]), 4_000);
        assert_eq!(rows[0].time_ms, 0.0);
        assert_eq!(rows[0].waits, 2);
    }
}
