use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value kind a schema field accepts. `null` is accepted by every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    #[serde(alias = "string")]
    Text,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "number")]
    Float,
    #[serde(alias = "bool")]
    Boolean,
    Datetime,
    Json,
}

impl FieldKind {
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        if value.is_null() {
            return Ok(());
        }

        let ok = match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Datetime => {
                return match value.as_str() {
                    Some(s) => chrono::DateTime::parse_from_rfc3339(s)
                        .map(|_| ())
                        .map_err(|e| format!("expected RFC 3339 datetime: {}", e)),
                    None => Err(format!("expected RFC 3339 datetime string, got {}", value)),
                };
            }
            FieldKind::Json => true,
        };

        if ok {
            Ok(())
        } else {
            Err(format!("expected {:?}, got {}", self, value))
        }
    }

    /// Converts scalar values between text and numbers when the target kind
    /// calls for it. Anything else is returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (FieldKind::Text, Value::Number(n)) => Value::String(n.to_string()),
            (FieldKind::Text, Value::Bool(b)) => Value::String(b.to_string()),
            (FieldKind::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (FieldKind::Float, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (_, value) => value,
        }
    }
}

/// Marks a field as mapped to a data array column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMarker {
    /// Data array key; the property name is used when unset.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub property: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub column: Option<ColumnMarker>,
}

impl FieldSchema {
    pub fn new(property: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            property: property.into(),
            kind,
            id: false,
            column: None,
        }
    }

    pub fn identifier(mut self) -> Self {
        self.id = true;
        self
    }

    pub fn column(mut self, name: Option<&str>) -> Self {
        self.column = Some(ColumnMarker {
            name: name.map(str::to_string),
        });
        self
    }

    /// Key used for this field in a data array.
    pub fn column_name(&self) -> &str {
        self.column
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or(&self.property)
    }
}

/// Declarative description of a model: its name and ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, property: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.property == property)
    }
}
