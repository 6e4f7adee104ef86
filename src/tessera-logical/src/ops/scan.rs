//! Scan operators: the sources of every plan.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Storage format of tabular files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    Parquet,
    Csv,
    Json,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Parquet => "Parquet",
            Self::Csv => "Csv",
            Self::Json => "Json",
        };
        write!(f, "{name}")
    }
}

/// How to read a set of tabular files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanInfo {
    pub file_format: FileFormat,
    /// Columns to read. `None` reads every column.
    pub columns: Option<Vec<String>>,
    /// Predicate pushed into the reader.
    pub predicate: Option<LogicalExpr>,
    /// Row limit pushed into the reader.
    pub limit_rows: Option<usize>,
}

impl ScanInfo {
    pub fn new(file_format: FileFormat) -> Self {
        Self {
            file_format,
            columns: None,
            predicate: None,
            limit_rows: None,
        }
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: LogicalExpr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_limit_rows(mut self, limit: usize) -> Self {
        self.limit_rows = Some(limit);
        self
    }
}

/// One file found by a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub size_bytes: Option<usize>,
    /// Row count, when the listing could read it from file metadata.
    pub num_rows: Option<usize>,
}

impl FileInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size_bytes: None,
            num_rows: None,
        }
    }

    #[must_use]
    pub fn with_size_bytes(mut self, size: usize) -> Self {
        self.size_bytes = Some(size);
        self
    }

    #[must_use]
    pub fn with_num_rows(mut self, rows: usize) -> Self {
        self.num_rows = Some(rows);
        self
    }
}

/// Scan over partitions already held in memory, looked up by cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryScanOp {
    /// Key of the partition set to read.
    pub cache_key: String,
    pub num_partitions: usize,
    pub resource_request: ResourceRequest,
}

impl InMemoryScanOp {
    pub fn new(cache_key: impl Into<String>, num_partitions: usize) -> Self {
        Self {
            cache_key: cache_key.into(),
            num_partitions,
            resource_request: ResourceRequest::default(),
        }
    }
}

/// Scan over tabular files.
///
/// The input produces file-listing partitions; each listed file becomes one
/// output partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularFilesScanOp {
    /// File listing plan.
    pub input: Box<LogicalNode>,
    pub scan_info: ScanInfo,
    /// Number of files the listing is expected to produce.
    pub num_partitions: usize,
    pub resource_request: ResourceRequest,
}

impl TabularFilesScanOp {
    pub fn new(input: LogicalNode, scan_info: ScanInfo, num_partitions: usize) -> Self {
        Self {
            input: Box::new(input),
            scan_info,
            num_partitions,
            resource_request: ResourceRequest::default(),
        }
    }
}
