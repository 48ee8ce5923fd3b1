//! Lazy record stream over a prepared [`FieldCipher`].

use common::Record;
use serde::Serialize;
use tracing::{info, warn};

use super::FieldCipher;

/// Counters reported when a stream completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    /// Records yielded.
    pub records: usize,
    /// Fields replaced with a transformed value.
    pub transformed: usize,
    /// Fields left untouched after a transform failure.
    pub failed: usize,
}

/// Iterator adapter returned by [`FieldCipher::process`].
///
/// Pulls one record from upstream per `next()` call. Each per-field failure
/// is logged as a warning. The summary is logged by [`Processed::finish`],
/// which the caller invokes only once the input ended cleanly.
pub struct Processed<'a, I> {
    cipher: &'a FieldCipher,
    upstream: I,
    summary: StreamSummary,
}

impl<'a, I> Processed<'a, I> {
    pub(super) fn new(cipher: &'a FieldCipher, upstream: I) -> Self {
        Self {
            cipher,
            upstream,
            summary: StreamSummary::default(),
        }
    }

    /// Counters for the records yielded so far.
    pub fn summary(&self) -> StreamSummary {
        self.summary
    }

    /// Log the final counters and return them.
    pub fn finish(self) -> StreamSummary {
        info!(
            mode = %self.cipher.mode(),
            records = self.summary.records,
            transformed = self.summary.transformed,
            failed = self.summary.failed,
            "record stream complete"
        );
        self.summary
    }
}

impl<I: Iterator<Item = Record>> Iterator for Processed<'_, I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.upstream.next()?;
        let outcome = self.cipher.transform_record(record);
        for warning in &outcome.warnings {
            warn!(
                field = %warning.field,
                record = self.summary.records + 1,
                original = %warning.original,
                reason = %warning.reason,
                "field left untransformed"
            );
        }
        self.summary.records += 1;
        self.summary.transformed += outcome.transformed;
        self.summary.failed += outcome.warnings.len();
        Some(outcome.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}
