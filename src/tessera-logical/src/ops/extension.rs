//! User-defined operators.

use common_error::{ensure, TesseraError, TesseraResult};
use serde::{Deserialize, Serialize};

use crate::resource::ResourceRequest;

use super::LogicalNode;

/// An operator defined outside the core operator set.
///
/// The logical layer can carry, display and rewrite these nodes, but they
/// have no physical lowering. Deserialization goes through the same input
/// count check as [`ExtensionOp::try_new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExtensionOp")]
pub struct ExtensionOp {
    name: String,
    inputs: Vec<LogicalNode>,
    num_partitions: usize,
    pub resource_request: ResourceRequest,
}

impl ExtensionOp {
    /// Maximum number of inputs an extension may take.
    pub const MAX_INPUTS: usize = 2;

    pub fn try_new(
        name: impl Into<String>,
        inputs: Vec<LogicalNode>,
        num_partitions: usize,
    ) -> TesseraResult<Self> {
        let name = name.into();
        ensure!(
            inputs.len() <= Self::MAX_INPUTS,
            ValueError: "Extension '{name}' takes at most {} inputs, got {}",
            Self::MAX_INPUTS,
            inputs.len()
        );
        Ok(Self {
            name,
            inputs,
            num_partitions,
            resource_request: ResourceRequest::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[LogicalNode] {
        &self.inputs
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }
}

#[derive(Deserialize)]
struct RawExtensionOp {
    name: String,
    inputs: Vec<LogicalNode>,
    num_partitions: usize,
    resource_request: ResourceRequest,
}

impl TryFrom<RawExtensionOp> for ExtensionOp {
    type Error = TesseraError;

    fn try_from(raw: RawExtensionOp) -> TesseraResult<Self> {
        let mut op = Self::try_new(raw.name, raw.inputs, raw.num_partitions)?;
        op.resource_request = raw.resource_request;
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::InMemoryScanOp;

    fn scan(key: &str) -> LogicalNode {
        LogicalNode::InMemoryScan(InMemoryScanOp::new(key, 1))
    }

    #[test]
    fn test_try_new_rejects_third_input() {
        let err = ExtensionOp::try_new("udf", vec![scan("a"), scan("b"), scan("c")], 1)
            .unwrap_err();
        assert!(matches!(err, TesseraError::ValueError(_)));
    }

    #[test]
    fn test_deserialize_checks_input_count() {
        let op = ExtensionOp::try_new("udf", vec![scan("a"), scan("b")], 1).unwrap();
        let mut value = serde_json::to_value(&op).unwrap();
        let parsed: ExtensionOp = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(parsed, op);

        let third = value["inputs"][0].clone();
        value["inputs"].as_array_mut().unwrap().push(third);
        let err = serde_json::from_value::<ExtensionOp>(value).unwrap_err();
        assert!(err.to_string().contains("takes at most 2 inputs, got 3"));
    }
}
