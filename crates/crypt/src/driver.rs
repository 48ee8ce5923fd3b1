//! Newline-delimited JSON driver: stdin records in, stdout records out.
//!
//! For each input line the driver:
//! 1. Skips it if blank.
//! 2. Parses it as one JSON object.
//! 3. Passes it through the prepared [`FieldCipher`] and writes the result
//!    as a single line, flushed before the next line is read.
//!
//! A line that cannot be read or is not a JSON object ends the stream.
//! Records already written stay written.

use std::cell::Cell;
use std::io::{BufRead, Write};

use anyhow::{anyhow, Context, Result};
use common::Record;
use tracing::debug;

use crate::pipeline::{FieldCipher, StreamSummary};

/// Stream every record from `input` through `cipher` into `output`.
///
/// # Errors
///
/// Returns an error naming the 1-based line number if an input line cannot
/// be read or parsed, or if writing to `output` fails.
pub fn run<R, W>(cipher: &FieldCipher, input: R, mut output: W) -> Result<StreamSummary>
where
    R: BufRead,
    W: Write,
{
    let read_error = Cell::new(None);

    let records = input
        .lines()
        .enumerate()
        .map_while(|(index, line)| match parse_line(index + 1, line) {
            Ok(record) => Some(record),
            Err(e) => {
                read_error.set(Some(e));
                None
            }
        })
        .flatten();

    let mut processed = cipher.process(records);
    for record in processed.by_ref() {
        serde_json::to_writer(&mut output, &record).context("failed to serialise record")?;
        output.write_all(b"\n").context("failed to write record")?;
        output.flush().context("failed to flush output")?;
    }

    if let Some(e) = read_error.take() {
        return Err(e);
    }
    Ok(processed.finish())
}

/// Parse one input line; `Ok(None)` for a blank line.
fn parse_line(line_no: usize, line: std::io::Result<String>) -> Result<Option<Record>> {
    let line = line.with_context(|| format!("failed to read input line {line_no}"))?;
    if line.trim().is_empty() {
        debug!(line = line_no, "skipping blank line");
        return Ok(None);
    }
    serde_json::from_str(&line)
        .map(Some)
        .map_err(|e| anyhow!("input line {line_no} is not a JSON object: {e}"))
}
