//! Per-partition instructions.

use tessera_logical::expr::{AggExpr, LogicalExpr};
use tessera_logical::{FileInfo, JoinType, MapFunction, OutputFileInfo, ScanInfo};

use crate::partition::PartialPartitionMetadata;

/// An atomic operation over the partitions of one task.
///
/// Instructions are pure: given the same input partitions they produce the
/// same outputs. Most take one input and produce one output; fanouts produce
/// several outputs and merges and joins take several inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Read one file of a file listing.
    ReadFile {
        /// Output partition index within the scan.
        partition_id: usize,
        /// Index of the file within its listing partition.
        index: usize,
        file_info: FileInfo,
        scan_info: ScanInfo,
    },
    /// Write the input to files; outputs the written paths.
    WriteFile {
        partition_id: usize,
        output: OutputFileInfo,
    },
    Filter {
        predicate: LogicalExpr,
    },
    Project {
        projection: Vec<LogicalExpr>,
    },
    MapPartition {
        func: MapFunction,
    },
    LocalLimit {
        limit: usize,
    },
    /// Aggregate, grouped by `group_by`. No aggregations means distinct.
    Aggregate {
        to_agg: Vec<AggExpr>,
        group_by: Vec<LogicalExpr>,
    },
    /// Join inputs `[left, right]`.
    Join {
        left_on: Vec<LogicalExpr>,
        right_on: Vec<LogicalExpr>,
        how: JoinType,
    },
    /// Sample up to `size` rows, keeping only the sort columns.
    Sample {
        sort_by: Vec<LogicalExpr>,
        size: usize,
    },
    /// Merge samples into `num_quantiles - 1` range boundaries.
    ReduceToQuantiles {
        num_quantiles: usize,
        sort_by: Vec<LogicalExpr>,
        descending: Vec<bool>,
    },
    FanoutRandom {
        num_outputs: usize,
        seed: Option<u64>,
    },
    FanoutHash {
        num_outputs: usize,
        partition_by: Vec<LogicalExpr>,
    },
    /// Split inputs `[boundaries, source]` by key range.
    FanoutRange {
        num_outputs: usize,
        sort_by: Vec<LogicalExpr>,
        descending: Vec<bool>,
    },
    /// Concatenate all inputs.
    ReduceMerge,
    /// Concatenate all inputs, then sort.
    ReduceMergeAndSort {
        sort_by: Vec<LogicalExpr>,
        descending: Vec<bool>,
    },
}

impl Instruction {
    /// Get the name of this instruction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "ReadFile",
            Self::WriteFile { .. } => "WriteFile",
            Self::Filter { .. } => "Filter",
            Self::Project { .. } => "Project",
            Self::MapPartition { .. } => "MapPartition",
            Self::LocalLimit { .. } => "LocalLimit",
            Self::Aggregate { .. } => "Aggregate",
            Self::Join { .. } => "Join",
            Self::Sample { .. } => "Sample",
            Self::ReduceToQuantiles { .. } => "ReduceToQuantiles",
            Self::FanoutRandom { .. } => "FanoutRandom",
            Self::FanoutHash { .. } => "FanoutHash",
            Self::FanoutRange { .. } => "FanoutRange",
            Self::ReduceMerge => "ReduceMerge",
            Self::ReduceMergeAndSort { .. } => "ReduceMergeAndSort",
        }
    }

    /// Number of partitions this instruction produces.
    pub fn num_outputs(&self) -> usize {
        match self {
            Self::FanoutRandom { num_outputs, .. }
            | Self::FanoutHash { num_outputs, .. }
            | Self::FanoutRange { num_outputs, .. } => *num_outputs,
            _ => 1,
        }
    }

    /// What can be known about the outputs before running.
    pub fn partial_metadata(
        &self,
        inputs: &[PartialPartitionMetadata],
    ) -> Vec<PartialPartitionMetadata> {
        let unknown = PartialPartitionMetadata::unknown();
        match self {
            Self::ReadFile {
                file_info,
                scan_info,
                ..
            } => {
                let num_rows = match (file_info.num_rows, scan_info.limit_rows) {
                    (Some(rows), Some(limit)) => Some(rows.min(limit)),
                    (rows, None) => rows,
                    (None, Some(_)) => None,
                };
                vec![PartialPartitionMetadata {
                    num_rows,
                    size_bytes: None,
                }]
            }
            Self::Project { .. } | Self::MapPartition { .. } if inputs.len() == 1 => {
                vec![PartialPartitionMetadata {
                    num_rows: inputs[0].num_rows,
                    size_bytes: None,
                }]
            }
            Self::LocalLimit { limit } => {
                let num_rows = inputs.first().and_then(|m| m.num_rows).map(|n| n.min(*limit));
                vec![PartialPartitionMetadata {
                    num_rows,
                    size_bytes: None,
                }]
            }
            Self::ReduceMerge => vec![PartialPartitionMetadata {
                num_rows: sum_known(inputs.iter().map(|m| m.num_rows)),
                size_bytes: sum_known(inputs.iter().map(|m| m.size_bytes)),
            }],
            Self::ReduceMergeAndSort { .. } => vec![PartialPartitionMetadata {
                num_rows: sum_known(inputs.iter().map(|m| m.num_rows)),
                size_bytes: None,
            }],
            _ => vec![unknown; self.num_outputs()],
        }
    }
}

/// Sum of the values if all are known.
fn sum_known(values: impl Iterator<Item = Option<usize>>) -> Option<usize> {
    values.sum()
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalLimit { limit } => write!(f, "LocalLimit({limit})"),
            Self::FanoutRandom { num_outputs, .. }
            | Self::FanoutHash { num_outputs, .. }
            | Self::FanoutRange { num_outputs, .. } => {
                write!(f, "{}({num_outputs})", self.name())
            }
            Self::ReadFile { index, .. } => write!(f, "ReadFile({index})"),
            Self::WriteFile { partition_id, .. } => write!(f, "WriteFile({partition_id})"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_logical::{col, FileFormat};

    #[test]
    fn test_num_outputs() {
        let fanout = Instruction::FanoutHash {
            num_outputs: 4,
            partition_by: vec![col("k")],
        };
        assert_eq!(fanout.num_outputs(), 4);
        assert_eq!(Instruction::ReduceMerge.num_outputs(), 1);
    }

    #[test]
    fn test_partial_metadata() {
        let known = PartialPartitionMetadata {
            num_rows: Some(10),
            size_bytes: Some(80),
        };

        let limited = Instruction::LocalLimit { limit: 3 }.partial_metadata(&[known]);
        assert_eq!(limited[0].num_rows, Some(3));

        let merged = Instruction::ReduceMerge.partial_metadata(&[known, known]);
        assert_eq!(merged[0].num_rows, Some(20));
        assert_eq!(merged[0].size_bytes, Some(160));

        let merged =
            Instruction::ReduceMerge.partial_metadata(&[known, PartialPartitionMetadata::unknown()]);
        assert_eq!(merged[0].num_rows, None);

        let fanout = Instruction::FanoutRandom {
            num_outputs: 3,
            seed: None,
        }
        .partial_metadata(&[known]);
        assert_eq!(fanout.len(), 3);

        let read = Instruction::ReadFile {
            partition_id: 0,
            index: 0,
            file_info: FileInfo::new("a.parquet").with_num_rows(50),
            scan_info: ScanInfo::new(FileFormat::Parquet).with_limit_rows(20),
        }
        .partial_metadata(&[known]);
        assert_eq!(read[0].num_rows, Some(20));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::LocalLimit { limit: 7 }.to_string(), "LocalLimit(7)");
        assert_eq!(
            Instruction::FanoutRandom {
                num_outputs: 2,
                seed: Some(1)
            }
            .to_string(),
            "FanoutRandom(2)"
        );
        assert_eq!(Instruction::ReduceMerge.to_string(), "ReduceMerge");
    }
}
