//! Tunables for a [`Tree`](crate::Tree).

/// Default number of bytes yielded per read-stream chunk.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Default maximum number of link hops followed during one resolution.
pub const DEFAULT_MAX_LINK_DEPTH: usize = 40;

/// Configuration for a [`Tree`](crate::Tree).
///
/// # Example
///
/// ```rust
/// use memtree::TreeConfig;
///
/// let config = TreeConfig::default().with_read_chunk_size(16);
/// assert_eq!(config.read_chunk_size, 16);
/// assert_eq!(config.max_link_depth, 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Bytes per chunk produced by read streams. Zero is treated as one.
    pub read_chunk_size: usize,
    /// Link hops followed before resolution fails with
    /// [`FsError::LinkLoop`](crate::FsError::LinkLoop).
    pub max_link_depth: usize,
}

impl TreeConfig {
    /// Set the read chunk size.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the link hop limit.
    pub fn with_max_link_depth(mut self, depth: usize) -> Self {
        self.max_link_depth = depth;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_link_depth: DEFAULT_MAX_LINK_DEPTH,
        }
    }
}
