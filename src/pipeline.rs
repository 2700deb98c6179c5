use crate::enrich::enrich;
use crate::index::RankIndex;
use crate::join::{write_records, ScanJoiner};
use crate::reshape::flatten_responses;
use crate::source::{open_source, OutputSink, Source};
use crate::stats::PipelineStats;
use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Input and output locations for a full run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub ranking: Option<PathBuf>,
    pub topics: Option<PathBuf>,
    pub scan: Option<PathBuf>,
    /// `None` writes to stdout
    pub output: Option<PathBuf>,
    pub flatten_responses: bool,
}

impl PipelineConfig {
    /// Checks every input is given and exists, before anything is read.
    pub fn validate(&self) -> Result<(&Path, &Path, &Path)> {
        let ranking = required(&self.ranking, "ranking")?;
        let topics = required(&self.topics, "topics")?;
        let scan = required(&self.scan, "scan")?;
        Ok((ranking, topics, scan))
    }
}

fn required<'a>(path: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    let Some(path) = path.as_deref() else {
        bail!("Missing required {} input", name);
    };
    if !path.exists() {
        bail!("The {} input does not exist: {:?}", name, path);
    }
    Ok(path)
}

/// Opens all sources, runs the three stages and finalizes the output sink.
///
/// The output is only created once the ranking and topic stages succeeded, so
/// a run that fails on corrupt reference data leaves an existing output alone.
pub fn run(config: &PipelineConfig) -> Result<PipelineStats> {
    let (ranking, topics, scan) = config.validate()?;

    let ranking = open_source(ranking)?;
    let topics = open_source(topics)?;
    let scan = open_source(scan)?;

    let (stats, sink) = run_streams(
        ranking,
        topics,
        scan,
        || OutputSink::create(config.output.as_deref()),
        config.flatten_responses,
    )?;
    sink.finish()?;
    Ok(stats)
}

/// Load -> enrich -> join, strictly in that order.
///
/// Enrichment has to finish before the first lookup: joining removes records
/// from the index, so a late topic page would have nothing left to merge into.
/// `open_output` is called right before the join stage and the writer is
/// handed back for finalizing.
pub fn run_streams<R, T, S, W, O>(
    ranking: Source<R>,
    topics: Source<T>,
    scan: Source<S>,
    open_output: O,
    flatten: bool,
) -> Result<(PipelineStats, W)>
where
    R: BufRead,
    T: BufRead,
    S: BufRead,
    W: Write,
    O: FnOnce() -> Result<W>,
{
    let stats = PipelineStats::new();

    let start = Instant::now();
    let mut index = RankIndex::load(ranking.reader, &ranking.name)?;
    stats.set_ranked(index.len() as u64, index.duplicates());
    info!(
        domains = index.len(),
        duration_secs = start.elapsed().as_secs_f64(),
        "Ranking stage complete"
    );

    let start = Instant::now();
    let matched = enrich(topics, &mut index, &stats)?;
    info!(
        matched,
        duration_secs = start.elapsed().as_secs_f64(),
        "Topic stage complete"
    );

    let mut out = open_output()?;

    let start = Instant::now();
    info!("Joining results with host scan data from: {}", scan.name);
    let mut joiner = ScanJoiner::new(scan, index);
    let records = joiner.by_ref().map(|record| {
        record.map(|mut record| {
            if flatten {
                flatten_responses(&mut record);
            }
            record
        })
    });
    let written = write_records(records, &mut out)?;

    let joined = joiner.joined();
    let unclaimed = joiner.into_index().len();
    stats.add_scan_records(written);
    stats.add_scan_joined(joined);
    info!(
        records = written,
        joined,
        unclaimed,
        duration_secs = start.elapsed().as_secs_f64(),
        "Join stage complete"
    );

    Ok((stats, out))
}
