use crate::config::{INDEX_CAPACITY, PROGRESS_INTERVAL};
use crate::models::{PageRecord, RankRecord};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use std::io::Read;
use tracing::{debug, info, warn};

/// Registrable domain -> ranking record, the join target for both later stages.
pub struct RankIndex {
    records: FxHashMap<String, RankRecord>,
    merges: u64,
    duplicates: u64,
}

impl RankIndex {
    /// Loads `rank,domain` lines. Any malformed line aborts the load.
    ///
    /// Domains are used verbatim as keys. A domain listed twice keeps the
    /// later rank; the overwrite is counted and reported but not rejected.
    pub fn load<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut index = Self::with_capacity(INDEX_CAPACITY);
        let mut record = StringRecord::new();
        let pb = ProgressBar::new_spinner();

        info!("Loading ranking data from: {}", source);

        loop {
            let more = csv
                .read_record(&mut record)
                .with_context(|| format!("Failed to read ranking source: {}", source))?;
            if !more {
                break;
            }
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() != 2 {
                bail!(
                    "Malformed ranking line {} in {}: expected `rank,domain`, found {} field(s)",
                    line,
                    source,
                    record.len()
                );
            }

            let rank: u64 = record[0].parse().with_context(|| {
                format!(
                    "Malformed ranking line {} in {}: rank {:?} is not a non-negative integer",
                    line, source, &record[0]
                )
            })?;
            let domain = &record[1];
            if domain.is_empty() {
                bail!("Malformed ranking line {} in {}: empty domain", line, source);
            }

            index.insert(RankRecord::new(domain.to_string(), rank));

            if line % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        }

        pb.finish_and_clear();

        if index.duplicates > 0 {
            warn!(
                duplicates = index.duplicates,
                "Ranking source lists some domains more than once; later entries won"
            );
        }
        info!(domains = index.len(), "Ranking index built successfully");

        Ok(index)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            merges: 0,
            duplicates: 0,
        }
    }

    /// Builds an index from `(domain, rank)` pairs with the same overwrite rule as `load`.
    pub fn from_ranks<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut index = Self::with_capacity(0);
        for (domain, rank) in ranks {
            index.insert(RankRecord::new(domain.into(), rank));
        }
        index
    }

    fn insert(&mut self, record: RankRecord) {
        if let Some(previous) = self.records.insert(record.domain.clone(), record) {
            debug!(domain = %previous.domain, rank = previous.rank, "Overwriting ranked domain");
            self.duplicates += 1;
        }
    }

    pub fn get(&self, domain: &str) -> Option<&RankRecord> {
        self.records.get(domain)
    }

    /// Folds a topic page into the record for `domain`, if that domain is ranked.
    ///
    /// The topic is always appended. `url`, `title` and `description` are only
    /// filled while still unset, so the first page seen for a domain wins them.
    pub fn merge(&mut self, domain: &str, page: PageRecord) -> bool {
        let Some(record) = self.records.get_mut(domain) else {
            return false;
        };

        record.topics.push(page.topic);
        if record.url.is_none() {
            record.url = Some(page.url);
        }
        if record.title.is_none() {
            record.title = page.title;
        }
        if record.description.is_none() {
            record.description = page.description;
        }

        self.merges += 1;
        true
    }

    /// Removes and returns the record for `domain`; a second call returns `None`.
    pub fn take(&mut self, domain: &str) -> Option<RankRecord> {
        self.records.remove(domain)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of successful `merge` calls
    pub fn merges(&self) -> u64 {
        self.merges
    }

    /// Number of ranking entries that overwrote an earlier entry for the same domain
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
}
