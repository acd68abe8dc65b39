use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use schemars::JsonSchema;
use std::collections::BTreeSet;

use crate::error::ToolError;

/// Parameter schema in the shape function declarations expect:
/// `{"type": "object", "properties": {...}, "required": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: serde_json::Map<String, Value>,
    pub required: Vec<String>,
}

impl From<schemars::Schema> for InputSchema {
    fn from(schema: schemars::Schema) -> Self {
        let root = schema.as_object();

        let schema_type = root
            .and_then(|obj| obj.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("object")
            .to_string();

        let properties: serde_json::Map<String, Value> = root
            .and_then(|obj| obj.get("properties"))
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, property)| (name.clone(), declared_keys_only(property)))
                    .collect()
            })
            .unwrap_or_default();

        let required: BTreeSet<String> = root
            .and_then(|obj| obj.get("required"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();

        Self {
            schema_type,
            properties,
            required: required.into_iter().collect(),
        }
    }
}

impl InputSchema {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str)
    }
}

// Function declarations reject titles, defaults and `$schema` keys.
fn declared_keys_only(property: &Value) -> Value {
    match property.as_object() {
        Some(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| matches!(key.as_str(), "type" | "description" | "enum" | "format"))
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect(),
        ),
        None => property.clone(),
    }
}

/// A tool as declared to the remote model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: InputSchema,
}

pub trait ToolSpec {
    type Params: DeserializeOwned + JsonSchema + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn declaration() -> ToolDeclaration {
        ToolDeclaration {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: schemars::schema_for!(Self::Params).into(),
        }
    }

    /// Deserializes call arguments. Only presence and JSON type are checked.
    fn parse_params(args: &serde_json::Map<String, Value>) -> Result<Self::Params, ToolError> {
        serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| ToolError::invalid_params(Self::NAME, e.to_string()))
    }
}
