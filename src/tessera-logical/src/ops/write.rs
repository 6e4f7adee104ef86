//! File write sink.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::{FileFormat, LogicalNode};

/// Where and how to write output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFileInfo {
    pub root_dir: String,
    pub file_format: FileFormat,
    /// Columns used to lay out output directories.
    pub partition_cols: Option<Vec<LogicalExpr>>,
    pub compression: Option<String>,
}

impl OutputFileInfo {
    pub fn new(root_dir: impl Into<String>, file_format: FileFormat) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_format,
            partition_cols: None,
            compression: None,
        }
    }

    #[must_use]
    pub fn with_partition_cols(mut self, cols: Vec<LogicalExpr>) -> Self {
        self.partition_cols = Some(cols);
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }
}

/// Writes every input partition to files; outputs the written paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileWriteOp {
    pub input: Box<LogicalNode>,
    pub output: OutputFileInfo,
    pub resource_request: ResourceRequest,
}

impl FileWriteOp {
    pub fn new(input: LogicalNode, output: OutputFileInfo) -> Self {
        Self {
            input: Box::new(input),
            output,
            resource_request: ResourceRequest::default(),
        }
    }
}
