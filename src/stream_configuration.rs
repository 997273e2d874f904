//! Configuration types for stream construction

use serde::{Deserialize, Serialize};

/// Construction-time settings shared by every node a combinator synthesizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Cache the result of each link thunk after its first successful forcing.
    ///
    /// Turning this off trades referential stability for memory: every read
    /// of `next`/`previous` re-runs the thunk.
    pub does_memoize: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { does_memoize: true }
    }
}

impl StreamConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether link thunks are cached
    pub fn does_memoize(mut self, does_memoize: bool) -> Self {
        self.does_memoize = does_memoize;
        self
    }

    /// Nodes cache every forced link
    pub fn memoizing() -> Self {
        Self { does_memoize: true }
    }

    /// Nodes re-run their thunks on every access
    pub fn non_memoizing() -> Self {
        Self { does_memoize: false }
    }
}
