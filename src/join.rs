use crate::config::{HOST_FIELD, PROGRESS_INTERVAL};
use crate::index::RankIndex;
use crate::models::{RankRecord, ScanRecord};
use crate::source::Source;
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::trace;

/// Streams scan records, enriching each with the ranked record for its `Host`.
///
/// Owns the index: every match is taken out of it, so a host repeated later in
/// the scan passes through unenriched. A malformed line is yielded as an error
/// once, after which the iterator is exhausted.
pub struct ScanJoiner<R> {
    source: Source<R>,
    index: RankIndex,
    line: String,
    line_no: u64,
    joined: u64,
    emitted: u64,
    done: bool,
}

impl<R: BufRead> ScanJoiner<R> {
    pub fn new(source: Source<R>, index: RankIndex) -> Self {
        Self {
            source,
            index,
            line: String::new(),
            line_no: 0,
            joined: 0,
            emitted: 0,
            done: false,
        }
    }

    /// Records that received enrichment fields
    pub fn joined(&self) -> u64 {
        self.joined
    }

    /// Records yielded so far, enriched or not
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Hands back whatever ranked domains no scan record claimed.
    pub fn into_index(self) -> RankIndex {
        self.index
    }

    fn next_record(&mut self) -> Result<Option<ScanRecord>> {
        loop {
            self.line.clear();
            let read = self
                .source
                .reader
                .read_line(&mut self.line)
                .with_context(|| {
                    format!(
                        "Failed to read line {} of scan source {}",
                        self.line_no + 1,
                        self.source.name
                    )
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            let mut record: ScanRecord = serde_json::from_str(line).with_context(|| {
                format!(
                    "Malformed JSON object on line {} of scan source {}",
                    self.line_no, self.source.name
                )
            })?;

            let taken = match record.get(HOST_FIELD) {
                Some(Value::String(host)) => self.index.take(host),
                Some(_) => bail!(
                    "`{}` is not a string on line {} of scan source {}",
                    HOST_FIELD,
                    self.line_no,
                    self.source.name
                ),
                None => bail!(
                    "Missing `{}` on line {} of scan source {}",
                    HOST_FIELD,
                    self.line_no,
                    self.source.name
                ),
            };

            if let Some(rank) = taken {
                trace!(host = %rank.domain, rank = rank.rank, "Joined scan record");
                merge_into(&mut record, rank)?;
                self.joined += 1;
            }

            self.emitted += 1;
            return Ok(Some(record));
        }
    }
}

impl<R: BufRead> Iterator for ScanJoiner<R> {
    type Item = Result<ScanRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Adds the ranking/topic fields to `record`. Keys the scan already has are kept as-is.
pub fn merge_into(record: &mut ScanRecord, rank: RankRecord) -> Result<()> {
    let enrichment =
        serde_json::to_value(rank).context("Failed to serialize ranking record")?;
    if let Value::Object(fields) = enrichment {
        for (key, value) in fields {
            record.entry(key).or_insert(value);
        }
    }
    Ok(())
}

/// Writes one JSON object per line in iteration order; stops at the first error.
pub fn write_records<I, W>(records: I, out: &mut W) -> Result<u64>
where
    I: IntoIterator<Item = Result<ScanRecord>>,
    W: Write,
{
    let pb = ProgressBar::new_spinner();
    let mut written = 0u64;

    for record in records {
        let record = record?;
        serde_json::to_writer(&mut *out, &record).context("Failed to write output record")?;
        out.write_all(b"\n").context("Failed to write output record")?;
        written += 1;

        if written % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }

    pb.finish_and_clear();
    out.flush().context("Failed to flush output")?;
    Ok(written)
}
