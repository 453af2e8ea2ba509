//! Protocol step shapes and their unit operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Scalar value of a unit-operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

/// The structured parameters of a single protocol step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitOperation {
    /// Stable operation id. Absent ids are synthesized on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Ids of linked domain objects (inventory, equipment, ...).
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl UnitOperation {
    pub fn new(op_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Link a domain object, ignoring ids already linked.
    pub fn link_object(&mut self, object_id: &str) -> bool {
        if self.objects.iter().any(|o| o == object_id) {
            return false;
        }
        self.objects.push(object_id.to_string());
        true
    }
}

/// Payload of a `protocol_node` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolNode {
    #[serde(rename = "protocolData")]
    pub operation: UnitOperation,
    /// Steps sharing this tag execute concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group_id: Option<String>,
}

impl ProtocolNode {
    pub fn new(operation: UnitOperation) -> Self {
        Self {
            operation,
            parallel_group_id: None,
        }
    }

    pub fn in_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group_id = Some(group.into());
        self
    }
}
