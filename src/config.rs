use crate::id::IdEncoding;

/// Default per-bucket capacity, matching the classic Kademlia k = 20.
pub const DEFAULT_BUCKET_SIZE: usize = 20;

/// Default number of parallel tables.
pub const DEFAULT_TABLE_COUNT: usize = 3;

/// Default search-window expansion rate for closest-peer merges.
pub const DEFAULT_PREFERENCE_FACTOR: usize = 2;

/// Construction options for [`KademliaTables`](crate::KademliaTables).
///
/// The bucket count is not configurable; it is derived from the local
/// identifier's bit length at construction and never changes.
#[derive(Debug, Clone)]
pub struct TablesConfig {
    /// Per-bucket capacity, forwarded to every table.
    pub bucket_size: usize,
    /// Number of parallel tables the classifier partitions peers into.
    pub table_count: usize,
    /// Multiplicative rate at which the closest-peer search window grows
    /// as lower-preference tables are consulted.
    pub preference_factor: usize,
    /// How a string identifier is decoded.
    pub encoding: IdEncoding,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            table_count: DEFAULT_TABLE_COUNT,
            preference_factor: DEFAULT_PREFERENCE_FACTOR,
            encoding: IdEncoding::default(),
        }
    }
}
