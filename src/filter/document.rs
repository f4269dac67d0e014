//! Saved filter documents.
//!
//! ```json
//! {
//!   "version": "v0.4.3",
//!   "groups": [
//!     {"op": "UND", "blocks": [{"field": "age", "operator": ">=", "value1": "30", "value2": ""}]}
//!   ]
//! }
//! ```
//!
//! Reading is tolerant: anything missing or of the wrong shape below the
//! top-level object falls back to a default instead of failing.

use super::model::{Condition, FilterModel, Group, JoinOp, Operator};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub const DOCUMENT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub groups: Vec<DocumentGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGroup {
    pub op: String,
    pub blocks: Vec<DocumentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBlock {
    pub field: String,
    pub operator: String,
    pub value1: String,
    pub value2: String,
}

pub fn serialize(model: &FilterModel) -> Document {
    let groups = model
        .groups()
        .iter()
        .map(|group| DocumentGroup {
            op: group.join().token().to_string(),
            blocks: group.conditions().iter().map(block_from_condition).collect(),
        })
        .collect();

    Document {
        version: DOCUMENT_VERSION.to_string(),
        groups,
    }
}

fn block_from_condition(cond: &Condition) -> DocumentBlock {
    let value2 = if cond.operator == Operator::Between {
        cond.value2.trim().to_string()
    } else {
        String::new()
    };
    DocumentBlock {
        field: cond.field.clone(),
        operator: cond.operator.token().to_string(),
        value1: cond.value1.trim().to_string(),
        value2,
    }
}

/// Reads a document and builds the model it describes.
pub fn parse(input: &str) -> Result<FilterModel> {
    Ok(Document::from_json(input)?.to_model())
}

impl Document {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Format(e.to_string()))
    }

    /// Fails only when `input` is not JSON or its top level is not an object.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(input).map_err(|e| Error::Format(e.to_string()))?;
        let Some(obj) = value.as_object() else {
            return Err(Error::Format(
                "filter document must be a JSON object".to_string(),
            ));
        };

        let version = lenient_string(obj, "version", "");
        let groups = match obj.get("groups") {
            Some(JsonValue::Array(items)) => items.iter().map(group_from_json).collect(),
            Some(other) => {
                tracing::debug!(found = %type_name(other), "ignoring non-array 'groups'");
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(Self { version, groups })
    }

    pub fn to_model(&self) -> FilterModel {
        let groups = self
            .groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let fallback = if i == 0 { JoinOp::And } else { JoinOp::Or };
                let join = group.op.parse().unwrap_or_else(|_| {
                    tracing::debug!(op = %group.op, "unknown group operator, keeping default");
                    fallback
                });
                let conditions = group.blocks.iter().map(condition_from_block).collect();
                Group::with_conditions(join, conditions)
            })
            .collect();

        FilterModel::from_groups(groups, "")
    }
}

fn condition_from_block(block: &DocumentBlock) -> Condition {
    let operator = block.operator.parse().unwrap_or_else(|_| {
        tracing::debug!(operator = %block.operator, "unknown operator, using '='");
        Operator::Eq
    });
    Condition::new(
        block.field.clone(),
        operator,
        block.value1.clone(),
        block.value2.clone(),
    )
}

fn group_from_json(value: &JsonValue) -> DocumentGroup {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let blocks = match obj.get("blocks") {
        Some(JsonValue::Array(items)) => items.iter().map(block_from_json).collect(),
        _ => Vec::new(),
    };

    DocumentGroup {
        op: lenient_string(obj, "op", JoinOp::And.token()),
        blocks,
    }
}

fn block_from_json(value: &JsonValue) -> DocumentBlock {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    DocumentBlock {
        field: lenient_string(obj, "field", ""),
        operator: lenient_string(obj, "operator", Operator::Eq.token()),
        value1: lenient_string(obj, "value1", ""),
        value2: lenient_string(obj, "value2", ""),
    }
}

fn lenient_string(obj: &Map<String, JsonValue>, key: &str, default: &str) -> String {
    match obj.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
