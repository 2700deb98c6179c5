//! Hostjoin: domain ranking, topic directory and host scan join pipeline
//!
//! This crate joins three independently produced web-domain datasets into one
//! enriched, line-delimited JSON stream keyed by hostname:
//!
//! 1. **Ranking Pass** -- Load `rank,domain` lines into an in-memory index keyed
//!    by registrable domain
//! 2. **Topic Pass** -- Stream the topic directory dump, normalize every page URL
//!    to its registrable domain and merge topic, title and description into the
//!    matching ranked domain
//! 3. **Join Pass** -- Stream host scan records, take each record's `Host` out of
//!    the index and emit the merged record immediately
//!
//! # Architecture
//!
//! - **Streaming inputs** -- The topic dump and scan stream are never loaded into
//!   memory; only the ranking index is resident
//! - **Event-based XML parsing** -- Page fields are collected from the event
//!   stream, no sub-document is re-parsed
//! - **Public Suffix List** -- `example.co.uk` is a registrable domain, not `co.uk`
//! - **Destructive join** -- `RankIndex::take` guarantees a host is enriched at
//!   most once
//! - **Order preserving output** -- One output object per scan line, in scan order
//!
//! # Key Modules
//!
//! - [`normalize`] -- URL to registrable domain and join eligibility
//! - [`index`] -- Ranking index with merge and take
//! - [`parser`] -- Streaming topic directory reader
//! - [`enrich`] -- Topic pass
//! - [`join`] -- Join pass and NDJSON writer
//! - [`pipeline`] -- Stage sequencing and configuration checks
//! - [`reshape`] -- Optional flattening of scan responses
//! - [`source`] -- Input decompression and output sinks
//! - [`models`] -- Core data types (RankRecord, PageRecord, ScanRecord)
//! - [`stats`] -- Counters for every stage
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! hostjoin --ranking top-1m.csv.gz --topics content.rdf.u8.gz --scan scan.json.gz > joined.json
//! ```

pub mod config;
pub mod enrich;
pub mod index;
pub mod join;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod reshape;
pub mod source;
pub mod stats;
