//! Declarative object schemas for plugin configuration and payloads.
//!
//! A [`Schema`] describes the shape of a JSON object (required/optional
//! fields, string constraints, enumerations, URLs, nested objects). It is
//! interpreted in two ways: [`Schema::validate`] checks a payload and
//! collects every violation, and [`Schema::to_json_schema`] exports a
//! JSON-Schema-compatible structure so external tooling can render
//! configuration forms from it. Both are pure.

use serde_json::{json, Map, Value};
use std::fmt;

/// The type constraint applied to a single field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// UTF-8 string, with optional length bounds (counted in chars).
    Str {
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    /// String restricted to a fixed set of allowed values.
    Enum { allowed: Vec<String> },
    /// http(s) URL-shaped string.
    Url,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Bool,
    /// Nested object validated against its own schema.
    Object(Schema),
}

/// One field of an object schema, plus presentation metadata used by
/// configuration UIs (title, placeholder, help text).
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub title: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            title: None,
            placeholder: None,
            help_text: None,
        }
    }

    /// Required string field.
    pub fn string(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Str {
                min_len: None,
                max_len: None,
            },
        )
    }

    /// Required string field restricted to `allowed` values.
    pub fn enumeration(name: &str, allowed: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    /// Required http(s) URL field.
    pub fn url(name: &str) -> Self {
        Self::new(name, FieldKind::Url)
    }

    /// Required numeric field.
    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Required boolean field.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// Required nested object field.
    pub fn object(name: &str, schema: Schema) -> Self {
        Self::new(name, FieldKind::Object(schema))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Minimum length constraint. Only meaningful for string fields.
    pub fn min_len(mut self, n: usize) -> Self {
        if let FieldKind::Str { min_len, .. } = &mut self.kind {
            *min_len = Some(n);
        }
        self
    }

    /// Maximum length constraint. Only meaningful for string fields.
    pub fn max_len(mut self, n: usize) -> Self {
        if let FieldKind::Str { max_len, .. } = &mut self.kind {
            *max_len = Some(n);
        }
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn help_text(mut self, help_text: &str) -> Self {
        self.help_text = Some(help_text.to_string());
        self
    }
}

/// Declarative schema for a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    additional_properties: bool,
}

/// A single violated constraint: which field, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

/// Validation failure enumerating every violated field.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            if v.field.is_empty() {
                write!(f, "{}", v.reason)?;
            } else {
                write!(f, "{}: {}", v.field, v.reason)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

impl Schema {
    /// Empty object schema that rejects unknown fields.
    pub fn object() -> Self {
        Self {
            fields: Vec::new(),
            additional_properties: false,
        }
    }

    /// Adds a field (builder-style).
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Accept fields not declared in the schema.
    pub fn allow_additional(mut self) -> Self {
        self.additional_properties = true;
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validates `value` against this schema.
    ///
    /// Collects every violation rather than stopping at the first, so an
    /// operator fixing a configuration sees all problems at once. A JSON
    /// `null` counts as an absent field.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        let mut violations = Vec::new();
        self.check(value, "", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { violations })
        }
    }

    fn check(&self, value: &Value, prefix: &str, violations: &mut Vec<Violation>) {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                violations.push(Violation {
                    field: prefix.to_string(),
                    reason: "expected an object".to_string(),
                });
                return;
            }
        };

        for spec in &self.fields {
            let path = join_path(prefix, &spec.name);
            match obj.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        violations.push(Violation {
                            field: path,
                            reason: "required field is missing".to_string(),
                        });
                    }
                }
                Some(v) => check_kind(&spec.kind, v, &path, violations),
            }
        }

        if !self.additional_properties {
            for key in obj.keys() {
                if !self.fields.iter().any(|f| &f.name == key) {
                    violations.push(Violation {
                        field: join_path(prefix, key),
                        reason: "unknown field".to_string(),
                    });
                }
            }
        }
    }

    /// Exports a JSON-Schema-compatible structure
    /// (`type: object`, `properties`, `required`, `additionalProperties`).
    ///
    /// This is the wire contract configuration UIs render forms from;
    /// presentation metadata rides along as extra property keys.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in &self.fields {
            properties.insert(spec.name.clone(), property_schema(spec));
            if spec.required {
                required.push(Value::String(spec.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": Value::Array(required),
            "additionalProperties": self.additional_properties,
        })
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn check_kind(kind: &FieldKind, value: &Value, path: &str, violations: &mut Vec<Violation>) {
    match kind {
        FieldKind::Str { min_len, max_len } => match value.as_str() {
            Some(s) => {
                let len = s.chars().count();
                if let Some(min) = min_len {
                    if len < *min {
                        violations.push(Violation {
                            field: path.to_string(),
                            reason: format!("must be at least {} characters", min),
                        });
                    }
                }
                if let Some(max) = max_len {
                    if len > *max {
                        violations.push(Violation {
                            field: path.to_string(),
                            reason: format!("must be at most {} characters", max),
                        });
                    }
                }
            }
            None => violations.push(Violation {
                field: path.to_string(),
                reason: "must be a string".to_string(),
            }),
        },
        FieldKind::Enum { allowed } => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => {}
            Some(s) => violations.push(Violation {
                field: path.to_string(),
                reason: format!("'{}' is not one of: {}", s, allowed.join(", ")),
            }),
            None => violations.push(Violation {
                field: path.to_string(),
                reason: "must be a string".to_string(),
            }),
        },
        FieldKind::Url => match value.as_str() {
            Some(s) => match reqwest::Url::parse(s) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                _ => violations.push(Violation {
                    field: path.to_string(),
                    reason: "must be a valid http(s) URL".to_string(),
                }),
            },
            None => violations.push(Violation {
                field: path.to_string(),
                reason: "must be a string".to_string(),
            }),
        },
        FieldKind::Number => {
            if !value.is_number() {
                violations.push(Violation {
                    field: path.to_string(),
                    reason: "must be a number".to_string(),
                });
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                violations.push(Violation {
                    field: path.to_string(),
                    reason: "must be a boolean".to_string(),
                });
            }
        }
        FieldKind::Object(schema) => schema.check(value, path, violations),
    }
}

fn property_schema(spec: &FieldSpec) -> Value {
    let mut prop = match &spec.kind {
        FieldKind::Str { min_len, max_len } => {
            let mut p = Map::new();
            p.insert("type".to_string(), json!("string"));
            if let Some(min) = min_len {
                p.insert("minLength".to_string(), json!(min));
            }
            if let Some(max) = max_len {
                p.insert("maxLength".to_string(), json!(max));
            }
            p
        }
        FieldKind::Enum { allowed } => {
            let mut p = Map::new();
            p.insert("type".to_string(), json!("string"));
            p.insert("enum".to_string(), json!(allowed));
            p
        }
        FieldKind::Url => {
            let mut p = Map::new();
            p.insert("type".to_string(), json!("string"));
            p.insert("format".to_string(), json!("uri"));
            p
        }
        FieldKind::Number => {
            let mut p = Map::new();
            p.insert("type".to_string(), json!("number"));
            p
        }
        FieldKind::Bool => {
            let mut p = Map::new();
            p.insert("type".to_string(), json!("boolean"));
            p
        }
        FieldKind::Object(schema) => match schema.to_json_schema() {
            Value::Object(p) => p,
            _ => Map::new(),
        },
    };
    if let Some(title) = &spec.title {
        prop.insert("title".to_string(), json!(title));
    }
    if let Some(placeholder) = &spec.placeholder {
        prop.insert("placeholder".to_string(), json!(placeholder));
    }
    if let Some(help_text) = &spec.help_text {
        prop.insert("help_text".to_string(), json!(help_text));
    }
    Value::Object(prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_schema() -> Schema {
        Schema::object()
            .field(
                FieldSpec::enumeration("language", &["pt_br", "en_us"])
                    .title("Language")
                    .placeholder("pt_br"),
            )
            .field(
                FieldSpec::string("city")
                    .title("City")
                    .help_text("City name to look up"),
            )
    }

    #[test]
    fn test_valid_payload_passes() {
        let schema = provider_schema();
        let payload = json!({"language": "pt_br", "city": "São Paulo"});
        assert!(schema.validate(&payload).is_ok());
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let schema = provider_schema();
        let err = schema.validate(&json!({"language": "pt_br"})).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "city");
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_all_violations_collected() {
        let schema = provider_schema();
        let err = schema
            .validate(&json!({"language": "fr", "extra": 1}))
            .unwrap_err();
        // bad enum value + missing city + unknown field
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let schema = provider_schema();
        let err = schema
            .validate(&json!({"language": "pt_br", "city": null}))
            .unwrap_err();
        assert_eq!(err.violations[0].field, "city");
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let schema = Schema::object().field(FieldSpec::string("note").optional());
        assert!(schema.validate(&json!({})).is_ok());
    }

    #[test]
    fn test_string_length_bounds() {
        let schema = Schema::object().field(FieldSpec::string("api_key").min_len(1).max_len(64));
        assert!(schema.validate(&json!({"api_key": "abc"})).is_ok());
        assert!(schema.validate(&json!({"api_key": ""})).is_err());
        let long = "x".repeat(65);
        assert!(schema.validate(&json!({ "api_key": long })).is_err());
    }

    #[test]
    fn test_url_field() {
        let schema = Schema::object().field(FieldSpec::url("base_url"));
        assert!(schema
            .validate(&json!({"base_url": "https://api.openweathermap.org/data/2.5"}))
            .is_ok());
        assert!(schema.validate(&json!({"base_url": "not a url"})).is_err());
        assert!(schema
            .validate(&json!({"base_url": "ftp://example.com"}))
            .is_err());
    }

    #[test]
    fn test_nested_object_paths() {
        let schema = Schema::object().field(FieldSpec::object(
            "auth",
            Schema::object().field(FieldSpec::string("token")),
        ));
        let err = schema.validate(&json!({"auth": {}})).unwrap_err();
        assert_eq!(err.violations[0].field, "auth.token");
    }

    #[test]
    fn test_non_object_payload() {
        let schema = provider_schema();
        let err = schema.validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.violations[0].reason, "expected an object");
    }

    #[test]
    fn test_additional_properties_flag() {
        let schema = Schema::object()
            .field(FieldSpec::string("city"))
            .allow_additional();
        assert!(schema
            .validate(&json!({"city": "Recife", "whatever": true}))
            .is_ok());
    }

    #[test]
    fn test_json_schema_export() {
        let exported = provider_schema().to_json_schema();
        assert_eq!(exported["type"], "object");
        assert_eq!(exported["additionalProperties"], false);
        assert_eq!(exported["properties"]["language"]["enum"][0], "pt_br");
        assert_eq!(exported["properties"]["city"]["title"], "City");
        assert_eq!(
            exported["properties"]["city"]["help_text"],
            "City name to look up"
        );
        let required: Vec<&str> = exported["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["language", "city"]);
    }

    #[test]
    fn test_json_schema_export_url_and_bounds() {
        let schema = Schema::object()
            .field(FieldSpec::url("base_url"))
            .field(FieldSpec::string("api_key").min_len(1).max_len(64).optional());
        let exported = schema.to_json_schema();
        assert_eq!(exported["properties"]["base_url"]["format"], "uri");
        assert_eq!(exported["properties"]["api_key"]["minLength"], 1);
        assert_eq!(exported["properties"]["api_key"]["maxLength"], 64);
        assert_eq!(exported["required"].as_array().unwrap().len(), 1);
    }
}
