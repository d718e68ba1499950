//! Batch driver: group rows per instrument and run the pipeline on each.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::error::SkipReason;
use crate::domain::ohlcv::PriceRow;
use crate::domain::pipeline::{self, PipelineConfig};
use crate::domain::scan_result::InstrumentResult;

/// An instrument that produced no record, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInstrument {
    pub instrument_id: i64,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: SkipReason,
}

fn serialize_reason<S: serde::Serializer>(reason: &SkipReason, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// Outcome of a batch: records ascending by instrument id, plus skips.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<InstrumentResult>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Rows keyed by instrument id; row order within an instrument is kept.
pub fn group_rows(rows: Vec<PriceRow>) -> BTreeMap<i64, Vec<PriceRow>> {
    let mut groups: BTreeMap<i64, Vec<PriceRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.instrument_id).or_default().push(row);
    }
    groups
}

/// Evaluates every instrument on the current rayon pool.
///
/// Instruments are independent; the ordered collect keeps the output sorted
/// by instrument id whatever order the workers finish in.
pub fn run_batch(rows: Vec<PriceRow>, config: &PipelineConfig) -> BatchReport {
    let groups = group_rows(rows);
    let outcomes: Vec<(i64, Result<InstrumentResult, SkipReason>)> = groups
        .par_iter()
        .map(|(id, rows)| (*id, pipeline::evaluate(rows, config)))
        .collect();

    let mut report = BatchReport::default();
    for (instrument_id, outcome) in outcomes {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(reason) => {
                warn!(instrument = instrument_id, "skipped: {reason}");
                report.skipped.push(SkippedInstrument {
                    instrument_id,
                    reason,
                });
            }
        }
    }
    info!(
        evaluated = report.results.len(),
        skipped = report.skipped.len(),
        mode = %config.mode,
        "batch complete"
    );
    report
}

/// Runs `op` on a dedicated pool of `threads` workers (`0` uses the
/// global pool).
pub fn with_thread_pool<R, F>(threads: usize, op: F) -> Result<R, rayon::ThreadPoolBuildError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if threads == 0 {
        return Ok(op());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    Ok(pool.install(op))
}

/// [`run_batch`] on a pool of `threads` workers.
pub fn run_batch_with_threads(
    rows: Vec<PriceRow>,
    config: &PipelineConfig,
    threads: usize,
) -> Result<BatchReport, rayon::ThreadPoolBuildError> {
    with_thread_pool(threads, || run_batch(rows, config))
}
