/// Progress update interval (tick every N records)
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Pre-size for the ranking index (ranking lists are usually the top 1M domains)
pub const INDEX_CAPACITY: usize = 1_000_000;

/// Read buffer for decompressed inputs
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Write buffer for the output stream
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// The only path a topic page may have to be joined against its domain
pub const ROOT_PATH: &str = "/";

/// The only subdomain allowed in front of a registrable domain
pub const WWW_SUBDOMAIN: &str = "www";

/// Join key on every scan record
pub const HOST_FIELD: &str = "Host";
