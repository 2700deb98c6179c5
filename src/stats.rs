use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected across the load, enrich and join stages
#[derive(Default)]
pub struct PipelineStats {
    pub ranked_domains: AtomicU64,
    pub duplicate_domains: AtomicU64,
    pub pages_seen: AtomicU64,
    pub pages_malformed: AtomicU64,
    pub pages_ineligible: AtomicU64,
    pub pages_unranked: AtomicU64,
    pub topic_matches: AtomicU64,
    pub scan_records: AtomicU64,
    pub scan_joined: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ranked(&self, domains: u64, duplicates: u64) {
        self.ranked_domains.store(domains, Ordering::Relaxed);
        self.duplicate_domains.store(duplicates, Ordering::Relaxed);
    }

    pub fn inc_pages(&self) {
        self.pages_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_malformed(&self, count: u64) {
        self.pages_malformed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_ineligible(&self) {
        self.pages_ineligible.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unranked(&self) {
        self.pages_unranked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_matches(&self) {
        self.topic_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_scan_records(&self, count: u64) {
        self.scan_records.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_scan_joined(&self, count: u64) {
        self.scan_joined.fetch_add(count, Ordering::Relaxed);
    }

    pub fn ranked(&self) -> u64 {
        self.ranked_domains.load(Ordering::Relaxed)
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicate_domains.load(Ordering::Relaxed)
    }

    pub fn pages(&self) -> u64 {
        self.pages_seen.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.pages_malformed.load(Ordering::Relaxed)
    }

    pub fn ineligible(&self) -> u64 {
        self.pages_ineligible.load(Ordering::Relaxed)
    }

    pub fn unranked(&self) -> u64 {
        self.pages_unranked.load(Ordering::Relaxed)
    }

    pub fn matches(&self) -> u64 {
        self.topic_matches.load(Ordering::Relaxed)
    }

    pub fn scanned(&self) -> u64 {
        self.scan_records.load(Ordering::Relaxed)
    }

    pub fn joined(&self) -> u64 {
        self.scan_joined.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = PipelineStats::new();
        assert_eq!(stats.ranked(), 0);
        assert_eq!(stats.duplicates(), 0);
        assert_eq!(stats.pages(), 0);
        assert_eq!(stats.malformed(), 0);
        assert_eq!(stats.ineligible(), 0);
        assert_eq!(stats.unranked(), 0);
        assert_eq!(stats.matches(), 0);
        assert_eq!(stats.scanned(), 0);
        assert_eq!(stats.joined(), 0);
    }

    #[test]
    fn set_ranked_overwrites() {
        let stats = PipelineStats::new();
        stats.set_ranked(10, 1);
        stats.set_ranked(20, 2);
        assert_eq!(stats.ranked(), 20);
        assert_eq!(stats.duplicates(), 2);
    }

    #[test]
    fn add_malformed() {
        let stats = PipelineStats::new();
        stats.add_malformed(3);
        stats.add_malformed(4);
        assert_eq!(stats.malformed(), 7);
    }

    #[test]
    fn mixed_operations() {
        let stats = PipelineStats::new();
        stats.inc_pages();
        stats.inc_pages();
        stats.inc_pages();
        stats.inc_ineligible();
        stats.inc_unranked();
        stats.inc_matches();
        stats.add_scan_records(2);
        stats.add_scan_joined(1);

        assert_eq!(stats.pages(), 3);
        assert_eq!(stats.ineligible(), 1);
        assert_eq!(stats.unranked(), 1);
        assert_eq!(stats.matches(), 1);
        assert_eq!(stats.scanned(), 2);
        assert_eq!(stats.joined(), 1);
    }
}
