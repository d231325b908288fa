// ABOUTME: JSON Schema descriptions of tool parameters, generation from Rust
// ABOUTME: types via the JsonSchema trait, and argument validation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            JsonType::Number => value.is_number(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
            JsonType::Null => value.is_null(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
        }
    }
}

/// `additionalProperties` is either a flag or a schema for extra values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<ToolParam>),
}

/// A JSON Schema node describing one parameter (or nested value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolParam {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ToolParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ToolParam>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<ToolParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolParam {
    pub fn of(kind: JsonType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of(JsonType::String)
    }

    pub fn integer() -> Self {
        Self::of(JsonType::Integer)
    }

    pub fn number() -> Self {
        Self::of(JsonType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(JsonType::Boolean)
    }

    pub fn null() -> Self {
        Self::of(JsonType::Null)
    }

    pub fn array(items: ToolParam) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(JsonType::Array)
        }
    }

    /// An object with a schema for every value (a string-keyed map).
    pub fn map(values: ToolParam) -> Self {
        Self {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Self::of(JsonType::Object)
        }
    }

    pub fn any_of(options: Vec<ToolParam>) -> Self {
        Self {
            any_of: Some(options),
            ..Self::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Check `value` against this schema. The error names the offending path.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), String> {
        if let Some(options) = &self.any_of {
            if !options.iter().any(|o| o.validate_at(path, value).is_ok()) {
                return Err(format!("{}: {} does not match any allowed schema", path, value));
            }
        }
        if let Some(kind) = self.kind {
            if !kind.matches(value) {
                return Err(format!("{}: expected {}, got {}", path, kind.as_str(), value));
            }
        }
        if let Some(values) = &self.enum_values {
            if !values.contains(value) {
                return Err(format!("{}: {} is not one of the allowed values", path, value));
            }
        }
        if let (Some(items), Some(array)) = (&self.items, value.as_array()) {
            for (i, item) in array.iter().enumerate() {
                items.validate_at(&format!("{}[{}]", path, i), item)?;
            }
        }
        if let Some(object) = value.as_object() {
            validate_object(
                path,
                object,
                self.properties.as_ref(),
                self.required.as_deref().unwrap_or_default(),
                self.additional_properties.as_ref(),
            )?;
        }
        Ok(())
    }
}

fn validate_object(
    path: &str,
    object: &serde_json::Map<String, Value>,
    properties: Option<&BTreeMap<String, ToolParam>>,
    required: &[String],
    additional: Option<&AdditionalProperties>,
) -> Result<(), String> {
    for name in required {
        if !object.contains_key(name) {
            return Err(format!("{}: missing required property '{}'", path, name));
        }
    }
    for (name, value) in object {
        let child = format!("{}.{}", path, name);
        match properties.and_then(|p| p.get(name)) {
            Some(schema) => schema.validate_at(&child, value)?,
            None => match additional {
                Some(AdditionalProperties::Allowed(false)) => {
                    return Err(format!("{}: unexpected property '{}'", path, name));
                }
                Some(AdditionalProperties::Schema(schema)) => schema.validate_at(&child, value)?,
                _ => {}
            },
        }
    }
    Ok(())
}

/// The top-level parameters of a tool: always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParams {
    #[serde(rename = "type")]
    pub kind: JsonType,
    #[serde(default)]
    pub properties: BTreeMap<String, ToolParam>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: bool,
}

impl Default for ToolParams {
    fn default() -> Self {
        Self {
            kind: JsonType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }
}

impl ToolParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing a parameter struct field by field.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(mut self, name: impl Into<String>, param: ToolParam) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, param);
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: impl Into<String>, param: ToolParam) -> Self {
        self.properties.insert(name.into(), param);
        self
    }

    /// Add a parameter whose schema and optionality come from `T`.
    pub fn typed<T: JsonSchema>(self, name: impl Into<String>, description: &str) -> Self {
        let param = T::json_schema().describe(description);
        if T::is_optional() {
            self.optional(name, param)
        } else {
            self.required(name, param)
        }
    }

    /// Validate tool call arguments.
    pub fn validate(&self, arguments: &Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err(format!("arguments must be a JSON object, got {}", arguments));
        };
        let additional = AdditionalProperties::Allowed(self.additional_properties);
        validate_object("$", object, Some(&self.properties), &self.required, Some(&additional))
    }

    /// The schema as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Types that can describe themselves as a JSON Schema.
pub trait JsonSchema {
    fn json_schema() -> ToolParam;

    /// Whether a parameter of this type may be omitted.
    fn is_optional() -> bool {
        false
    }
}

macro_rules! impl_json_schema {
    ($kind:expr => $($t:ty),+) => {
        $(impl JsonSchema for $t {
            fn json_schema() -> ToolParam {
                ToolParam::of($kind)
            }
        })+
    };
}

impl_json_schema!(JsonType::String => String, str, char);
impl_json_schema!(JsonType::Boolean => bool);
impl_json_schema!(JsonType::Integer => i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
impl_json_schema!(JsonType::Number => f32, f64);

impl<T: JsonSchema> JsonSchema for Vec<T> {
    fn json_schema() -> ToolParam {
        ToolParam::array(T::json_schema())
    }
}

impl<T: JsonSchema> JsonSchema for Option<T> {
    fn json_schema() -> ToolParam {
        ToolParam::any_of(vec![T::json_schema(), ToolParam::null()]).with_default(Value::Null)
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T: JsonSchema> JsonSchema for HashMap<String, T> {
    fn json_schema() -> ToolParam {
        ToolParam::map(T::json_schema())
    }
}

impl<T: JsonSchema> JsonSchema for BTreeMap<String, T> {
    fn json_schema() -> ToolParam {
        ToolParam::map(T::json_schema())
    }
}

impl JsonSchema for Value {
    fn json_schema() -> ToolParam {
        ToolParam::default()
    }
}

/// Schema for `T`.
pub fn json_schema<T: JsonSchema + ?Sized>() -> ToolParam {
    T::json_schema()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_schemas() {
        assert_eq!(json_schema::<String>().kind, Some(JsonType::String));
        assert_eq!(json_schema::<u32>().kind, Some(JsonType::Integer));
        assert_eq!(json_schema::<f64>().kind, Some(JsonType::Number));
        assert_eq!(json_schema::<bool>().kind, Some(JsonType::Boolean));
    }

    #[test]
    fn test_nested_schema_serializes_as_json_schema() {
        let schema = json_schema::<Vec<HashMap<String, Option<i64>>>>();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": {
                        "anyOf": [{"type": "integer"}, {"type": "null"}],
                        "default": null
                    }
                }
            })
        );
    }

    #[test]
    fn test_tool_params_builder() {
        let params = ToolParams::builder()
            .typed::<String>("command", "The command")
            .typed::<Option<u32>>("timeout", "Seconds");

        assert_eq!(params.required, vec!["command"]);
        let value = params.to_value();
        assert_eq!(value["type"], "object");
        assert_eq!(value["additionalProperties"], false);
        assert_eq!(value["properties"]["command"]["description"], "The command");
    }

    #[test]
    fn test_validate_accepts_valid_arguments() {
        let params = ToolParams::new()
            .required("path", ToolParam::string())
            .optional("lines", ToolParam::array(ToolParam::integer()));
        assert!(params.validate(&json!({"path": "a.txt", "lines": [1, 2]})).is_ok());
        assert!(params.validate(&json!({"path": "a.txt"})).is_ok());
    }

    #[test]
    fn test_validate_reports_problems() {
        let params = ToolParams::new()
            .required("path", ToolParam::string())
            .optional(
                "mode",
                ToolParam::string().with_enum(["read", "write"]),
            );

        let missing = params.validate(&json!({})).unwrap_err();
        assert!(missing.contains("missing required property 'path'"));

        let wrong_type = params.validate(&json!({"path": 3})).unwrap_err();
        assert!(wrong_type.contains("$.path: expected string"));

        let extra = params.validate(&json!({"path": "a", "other": 1})).unwrap_err();
        assert!(extra.contains("unexpected property 'other'"));

        let bad_enum = params
            .validate(&json!({"path": "a", "mode": "append"}))
            .unwrap_err();
        assert!(bad_enum.contains("not one of the allowed values"));

        assert!(params.validate(&json!("not an object")).is_err());
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        assert!(ToolParam::integer().validate(&json!(3.0)).is_ok());
        assert!(ToolParam::integer().validate(&json!(3.5)).is_err());
    }

    #[test]
    fn test_any_of_null() {
        let schema = json_schema::<Option<String>>();
        assert!(schema.validate(&json!(null)).is_ok());
        assert!(schema.validate(&json!("x")).is_ok());
        assert!(schema.validate(&json!(1)).is_err());
    }

    #[test]
    fn test_params_round_trip_from_json() {
        let value = json!({
            "type": "object",
            "properties": {"q": {"type": "string", "description": "query"}},
            "required": ["q"],
            "additionalProperties": false
        });
        let params: ToolParams = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(params.to_value(), value);
    }
}
