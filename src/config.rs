/// Manager configuration.
///
/// # Example
///
/// ```
/// use sdd_rs::config::SddConfig;
/// use sdd_rs::sdd::Manager;
///
/// let config = SddConfig::default().with_cache_bits(12).with_cache_limit(Some(1 << 16));
/// let mgr = Manager::with_config(config).unwrap();
/// assert_eq!(mgr.config().cache_bits, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SddConfig {
    /// Initial capacity of each operation cache, as `2^cache_bits` (default: 14).
    pub cache_bits: usize,
    /// Initial capacity of the unique tables, as `2^table_bits` (default: 16).
    pub table_bits: usize,
    /// Maximum number of entries per operation cache; a full cache is cleared (default: none).
    pub cache_limit: Option<usize>,
}

impl Default for SddConfig {
    fn default() -> Self {
        Self {
            cache_bits: 14,
            table_bits: 16,
            cache_limit: None,
        }
    }
}

impl SddConfig {
    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        self.cache_bits = cache_bits;
        self
    }

    pub fn with_table_bits(mut self, table_bits: usize) -> Self {
        self.table_bits = table_bits;
        self
    }

    pub fn with_cache_limit(mut self, cache_limit: Option<usize>) -> Self {
        self.cache_limit = cache_limit;
        self
    }
}
