//! Partitioning schemes.

use serde::{Deserialize, Serialize};

/// How rows are assigned to output partitions by a repartition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionScheme {
    /// No known assignment.
    Unknown,
    /// Rows spread uniformly at random.
    Random,
    /// Rows assigned by a hash of the partition keys.
    Hash,
    /// Rows assigned by sorted key ranges.
    Range,
}

impl PartitionScheme {
    /// True if the scheme assigns rows by key.
    pub const fn requires_keys(&self) -> bool {
        matches!(self, Self::Hash | Self::Range)
    }
}

impl std::fmt::Display for PartitionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Random => "Random",
            Self::Hash => "Hash",
            Self::Range => "Range",
        };
        write!(f, "{name}")
    }
}
