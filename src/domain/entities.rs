//! Domain entities read by the render pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{error::DomainError, types::EditMode};

/// Numeric identifier of an addressable content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub edit_mode: EditMode,
    /// The entity is password protected and the visitor has not supplied it.
    #[serde(default)]
    pub password_required: bool,
}

/// One node of the serialized element tree.
///
/// Child order is render order. Trees are acyclic by construction; nothing in
/// the pipeline re-validates that.
///
/// Deserialization goes through [`ElementTree::from_value`] for children, so
/// a malformed child is dropped without losing its siblings. Empty settings
/// stored as `[]` read as an empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ElementDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub element_type: String,
    pub settings: Map<String, Value>,
    pub children: Vec<ElementDescriptor>,
}

/// A decoded element tree and the number of descriptors dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTree {
    pub elements: Vec<ElementDescriptor>,
    pub skipped: usize,
}

impl ElementTree {
    /// Decode a stored tree. `null` is an empty tree; anything other than an
    /// array is rejected. Individual descriptors that are not objects or lack
    /// a type tag are skipped, at any depth.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        let items = match value {
            Value::Null => return Ok(Self::default()),
            Value::Array(items) => items,
            other => {
                return Err(DomainError::validation(format!(
                    "element tree must be an array, found {}",
                    json_kind(&other)
                )));
            }
        };

        let mut skipped = 0;
        let elements = decode_list(items, &mut skipped);
        Ok(Self { elements, skipped })
    }
}

fn decode_list(items: Vec<Value>, skipped: &mut usize) -> Vec<ElementDescriptor> {
    items
        .into_iter()
        .filter_map(|item| {
            let decoded = decode_descriptor(item, skipped);
            if decoded.is_none() {
                *skipped += 1;
            }
            decoded
        })
        .collect()
}

fn decode_descriptor(value: Value, skipped: &mut usize) -> Option<ElementDescriptor> {
    let Value::Object(mut object) = value else {
        return None;
    };

    let element_type = match object.remove("type") {
        Some(Value::String(tag)) if !tag.trim().is_empty() => tag.trim().to_string(),
        _ => return None,
    };

    let id = match object.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    let settings = match object.remove("settings") {
        Some(Value::Object(settings)) => settings,
        _ => Map::new(),
    };

    let children = match object.remove("elements").or_else(|| object.remove("children")) {
        Some(Value::Array(items)) => decode_list(items, skipped),
        _ => Vec::new(),
    };

    Some(ElementDescriptor {
        id,
        element_type,
        settings,
        children,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TryFrom<Value> for ElementDescriptor {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = json_kind(&value);
        let mut skipped = 0;
        decode_descriptor(value, &mut skipped).ok_or_else(|| {
            DomainError::validation(format!(
                "element descriptor must be an object with a type tag, found {kind}"
            ))
        })
    }
}

impl ElementDescriptor {
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            id: None,
            element_type: element_type.into(),
            settings: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ElementDescriptor) -> Self {
        self.children.push(child);
        self
    }

    /// String setting, trimmed; empty strings count as absent.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Integer setting, accepting numeric strings as stored by older editors.
    pub fn setting_u64(&self, key: &str) -> Option<u64> {
        match self.settings.get(key)? {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Parse a serialized element tree (a JSON array of descriptors).
    pub fn parse_tree(raw: &str) -> Result<ElementTree, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(ElementTree::default());
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|err| DomainError::validation(format!("invalid element tree: {err}")))?;
        ElementTree::from_value(value)
    }
}
