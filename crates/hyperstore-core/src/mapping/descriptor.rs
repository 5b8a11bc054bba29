//! Mapping descriptors as written in data manifests
//!
//! Expressions are kept as raw JSON values here; they are parsed and checked
//! against a file header by [`super::MappingPlan::compile`].

use crate::types::Category;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rule set turning the rows of one tabular file into records of one type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDescriptor {
    /// Target category
    pub class: Category,

    /// Target type name
    #[serde(rename = "type")]
    pub type_name: String,

    /// Public id of the new record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,

    /// Public id of an existing record to update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<Value>,

    /// Public id of the source node (edges)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_f: Option<Value>,

    /// Public id of the target node (edges)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_t: Option<Value>,

    /// Ordered member references (hyperedges)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<MemberDescriptor>>,

    /// Payload templates, a single one or a list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<SwitchDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_in: Option<Vec<Map<String, Value>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_out: Option<Vec<Map<String, Value>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpack: Option<Vec<UnpackDescriptor>>,
}

impl MappingDescriptor {
    pub fn new(class: Category, type_name: impl Into<String>) -> Self {
        Self {
            class,
            type_name: type_name.into(),
            key: None,
            join: None,
            key_f: None,
            key_t: None,
            keys: None,
            mappings: None,
            switch: None,
            filter_in: None,
            filter_out: None,
            unpack: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub class: Category,
    #[serde(rename = "type")]
    pub type_name: String,
    pub key: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchDescriptor {
    #[serde(default)]
    pub when: Vec<WhenDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenDescriptor {
    pub property: Value,
    pub value: Value,
    pub mappings: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultDescriptor {
    pub mappings: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpackDescriptor {
    /// Column whose value is split
    pub val: String,
    /// Separator expression
    pub split: Value,
}
