use serde::Serialize;
use serde_json::{Map, Value};

/// One scan line: an ordered JSON object with unknown fields kept verbatim.
pub type ScanRecord = Map<String, Value>;

/// A ranked domain plus everything the topic directory contributed to it.
///
/// Serializes to the enrichment keys added to a joined scan record. The domain
/// itself is not serialized since the scan record's `Host` already carries it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankRecord {
    #[serde(skip)]
    pub domain: String,
    pub rank: u64,
    #[serde(rename = "topic")]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RankRecord {
    pub fn new(domain: String, rank: u64) -> Self {
        Self {
            domain,
            rank,
            topics: Vec::new(),
            url: None,
            title: None,
            description: None,
        }
    }
}

/// A page entry from the topic directory, consumed as soon as it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub topic: String,
    pub title: Option<String>,
    pub description: Option<String>,
}
