//! Partition handles and their metadata.

use std::collections::HashMap;
use std::fmt::Debug;

use common_error::{TesseraError, TesseraResult};
use tessera_logical::FileInfo;

/// An opaque handle to one partition of rows.
///
/// The planning layer never looks inside a partition, except to read the
/// file listing held by partitions that feed a file scan.
pub trait Partition: Clone + Debug + Send + Sync + 'static {
    /// Files listed in this partition.
    fn file_infos(&self) -> Vec<FileInfo> {
        Vec::new()
    }
}

/// Exact statistics of a materialized partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionMetadata {
    pub num_rows: usize,
    pub size_bytes: usize,
}

impl PartitionMetadata {
    pub fn new(num_rows: usize, size_bytes: usize) -> Self {
        Self {
            num_rows,
            size_bytes,
        }
    }
}

/// Statistics of a partition that may not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialPartitionMetadata {
    pub num_rows: Option<usize>,
    pub size_bytes: Option<usize>,
}

impl PartialPartitionMetadata {
    /// Nothing known.
    pub fn unknown() -> Self {
        Self::default()
    }
}

impl From<PartitionMetadata> for PartialPartitionMetadata {
    fn from(meta: PartitionMetadata) -> Self {
        Self {
            num_rows: Some(meta.num_rows),
            size_bytes: Some(meta.size_bytes),
        }
    }
}

/// A partition produced by a finished task.
#[derive(Debug, Clone)]
pub struct MaterializedResult<P> {
    pub partition: P,
    pub metadata: PartitionMetadata,
}

impl<P: Partition> MaterializedResult<P> {
    pub fn new(partition: P, metadata: PartitionMetadata) -> Self {
        Self {
            partition,
            metadata,
        }
    }
}

/// An ordered collection of partitions registered under one key.
#[derive(Debug, Clone)]
pub struct PartitionSet<P> {
    key: String,
    partitions: Vec<P>,
}

impl<P: Partition> PartitionSet<P> {
    pub fn new(key: impl Into<String>, partitions: Vec<P>) -> Self {
        Self {
            key: key.into(),
            partitions,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Partitions in input order.
    pub fn partitions(&self) -> &[P] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Partition sets available to a plan, by key.
///
/// Only read during translation.
#[derive(Debug, Clone)]
pub struct PartitionSets<P> {
    sets: HashMap<String, PartitionSet<P>>,
}

impl<P: Partition> PartitionSets<P> {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// Register a partition set, replacing any set under the same key.
    pub fn insert(&mut self, set: PartitionSet<P>) -> Option<PartitionSet<P>> {
        self.sets.insert(set.key().to_string(), set)
    }

    /// Register partitions under `key`.
    #[must_use]
    pub fn with_set(mut self, key: impl Into<String>, partitions: Vec<P>) -> Self {
        self.insert(PartitionSet::new(key, partitions));
        self
    }

    /// Look up the partitions registered under `key`.
    pub fn get(&self, key: &str) -> TesseraResult<&PartitionSet<P>> {
        self.sets
            .get(key)
            .ok_or_else(|| TesseraError::partition_set_not_found(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl<P: Partition> Default for PartitionSets<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partition> FromIterator<PartitionSet<P>> for PartitionSets<P> {
    fn from_iter<I: IntoIterator<Item = PartitionSet<P>>>(iter: I) -> Self {
        let mut sets = Self::new();
        for set in iter {
            sets.insert(set);
        }
        sets
    }
}
