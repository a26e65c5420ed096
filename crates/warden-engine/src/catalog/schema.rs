//! Declarative input schemas for catalog commands.
//!
//! A schema is an ordered list of [`FieldRule`]s. [`InputSchema::parse`]
//! walks the fields in order, stops at the first violated rule, and returns
//! a normalized JSON object: strings trimmed, numeric strings coerced, list
//! fields turned into arrays, absent optional fields omitted.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use warden_core::constants::MAX_ID_LEN;
use warden_core::errors::{WardenError, WardenResult};

static ID_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").ok());

/// How a form should render the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Select,
}

/// The validation applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Resource identifier.
    Id,
    /// Free text of at least `min` characters after trimming.
    Text { min: usize },
    /// Whole number in `min..=max`. Numeric strings are accepted.
    Int { min: i64, max: i64 },
    /// One of a fixed set of strings.
    OneOf(&'static [&'static str]),
    /// Free-form list; a string is split on commas and newlines.
    List,
    /// Non-empty list of identifiers.
    IdList { empty_message: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub rule: Rule,
    pub required: bool,
    pub kind: FieldKind,
    pub placeholder: Option<&'static str>,
}

impl FieldRule {
    pub fn required(name: &'static str, label: &'static str, rule: Rule) -> Self {
        let kind = match rule {
            Rule::Int { .. } => FieldKind::Number,
            Rule::OneOf(_) => FieldKind::Select,
            Rule::List | Rule::IdList { .. } => FieldKind::Textarea,
            Rule::Id | Rule::Text { .. } => FieldKind::Text,
        };
        Self {
            name,
            label,
            rule,
            required: true,
            kind,
            placeholder: None,
        }
    }

    pub fn optional(name: &'static str, label: &'static str, rule: Rule) -> Self {
        Self {
            required: false,
            ..Self::required(name, label, rule)
        }
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Form metadata for one field, as exposed to callers that render inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldRule>,
}

impl InputSchema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .map(|f| FieldDescriptor {
                name: f.name,
                label: f.label,
                kind: f.kind,
                required: f.required,
                placeholder: f.placeholder,
                options: match f.rule {
                    Rule::OneOf(options) => Some(options),
                    _ => None,
                },
            })
            .collect()
    }

    /// Validate `input` and return its normalized form.
    pub fn parse(&self, input: &Value) -> WardenResult<Value> {
        let Value::Object(raw) = input else {
            return Err(WardenError::validation("Invalid command input."));
        };

        let mut out = Map::new();
        for field in &self.fields {
            match normalize(field, raw.get(field.name))? {
                Some(value) => {
                    out.insert(field.name.to_string(), value);
                }
                None if field.required => {
                    return Err(WardenError::validation(format!("{} is required.", field.label)));
                }
                None => {}
            }
        }
        Ok(Value::Object(out))
    }
}

/// `Ok(None)` means the field is absent. Empty strings and empty lists count
/// as absent, except for id lists which report their own message.
fn normalize(field: &FieldRule, raw: Option<&Value>) -> WardenResult<Option<Value>> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    match &field.rule {
        Rule::Id => {
            let Some(text) = trimmed(raw) else {
                return Ok(None);
            };
            if !is_valid_id(&text) {
                return Err(WardenError::validation(format!(
                    "{} must be a valid id.",
                    field.label
                )));
            }
            Ok(Some(Value::String(text)))
        }
        Rule::Text { min } => {
            let Some(text) = trimmed(raw) else {
                return Ok(None);
            };
            if text.chars().count() < *min {
                return Err(WardenError::validation(format!(
                    "{} must be at least {min} characters.",
                    field.label
                )));
            }
            Ok(Some(Value::String(text)))
        }
        Rule::Int { min, max } => {
            let number = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) if s.trim().is_empty() => return Ok(None),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            let Some(number) = number else {
                return Err(WardenError::validation(format!(
                    "{} must be a whole number.",
                    field.label
                )));
            };
            if number < *min || number > *max {
                return Err(WardenError::validation(format!(
                    "{} must be between {min} and {max}.",
                    field.label
                )));
            }
            Ok(Some(Value::from(number)))
        }
        Rule::OneOf(options) => {
            let Some(text) = trimmed(raw) else {
                return Ok(None);
            };
            if !options.contains(&text.as_str()) {
                return Err(WardenError::validation(format!(
                    "{} must be one of: {}.",
                    field.label,
                    options.join(", ")
                )));
            }
            Ok(Some(Value::String(text)))
        }
        Rule::List => {
            let items = split_list(raw, field.label)?;
            if items.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::from(items)))
        }
        Rule::IdList { empty_message } => {
            let items = split_list(raw, field.label)?;
            if items.is_empty() {
                return Err(WardenError::validation(*empty_message));
            }
            if items.iter().any(|id| !is_valid_id(id)) {
                return Err(WardenError::validation(format!(
                    "{} must contain valid ids.",
                    field.label
                )));
            }
            Ok(Some(Value::from(items)))
        }
    }
}

/// Scalars as trimmed text; `None` when empty after trimming.
fn trimmed(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn split_list(raw: &Value, label: &str) -> WardenResult<Vec<String>> {
    let items: Vec<String> = match raw {
        Value::Array(values) => values.iter().filter_map(trimmed).collect(),
        Value::String(s) => s
            .split(['\n', ','])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => {
            return Err(WardenError::validation(format!("{label} must be a list.")));
        }
    };
    Ok(items)
}

fn is_valid_id(candidate: &str) -> bool {
    candidate.len() <= MAX_ID_LEN
        && ID_PATTERN
            .as_ref()
            .is_some_and(|re| re.is_match(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ban_schema() -> InputSchema {
        InputSchema::new(vec![
            FieldRule::required("playerId", "Player ID", Rule::Id),
            FieldRule::required("durationMinutes", "Duration (minutes)", Rule::Int { min: 1, max: 43_200 }),
            FieldRule::required("reason", "Reason", Rule::Text { min: 8 }),
            FieldRule::optional("evidenceUrls", "Evidence URLs", Rule::List),
        ])
    }

    #[test]
    fn normalizes_strings_numbers_and_lists() {
        let parsed = ban_schema()
            .parse(&json!({
                "playerId": "  p1 ",
                "durationMinutes": "90",
                "reason": "  repeated griefing  ",
                "evidenceUrls": "https://a.example\n, https://b.example,,",
                "ignored": true,
            }))
            .unwrap();
        assert_eq!(
            parsed,
            json!({
                "playerId": "p1",
                "durationMinutes": 90,
                "reason": "repeated griefing",
                "evidenceUrls": ["https://a.example", "https://b.example"],
            })
        );
    }

    #[test]
    fn first_violation_in_field_order_wins() {
        let err = ban_schema()
            .parse(&json!({"playerId": "bad id!", "reason": "short"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Player ID must be a valid id.");
    }

    #[test]
    fn range_and_type_messages() {
        let schema = ban_schema();
        let err = schema
            .parse(&json!({"playerId": "p1", "durationMinutes": 0, "reason": "long enough"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Duration (minutes) must be between 1 and 43200.");

        let err = schema
            .parse(&json!({"playerId": "p1", "durationMinutes": "ten", "reason": "long enough"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Duration (minutes) must be a whole number.");
    }

    #[test]
    fn missing_required_field() {
        let err = ban_schema().parse(&json!({"playerId": "p1"})).unwrap_err();
        assert_eq!(err.to_string(), "Duration (minutes) is required.");
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = ban_schema().parse(&json!(["p1"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid command input.");
    }

    #[test]
    fn id_longer_than_limit_is_rejected() {
        let schema = InputSchema::new(vec![FieldRule::required("caseId", "Case ID", Rule::Id)]);
        let long = "c".repeat(MAX_ID_LEN + 1);
        assert!(schema.parse(&json!({"caseId": long})).is_err());
        let max = "c".repeat(MAX_ID_LEN);
        assert!(schema.parse(&json!({"caseId": max})).is_ok());
    }

    #[test]
    fn id_list_reports_empty_and_invalid() {
        let schema = InputSchema::new(vec![FieldRule::required(
            "reportIds",
            "Report IDs",
            Rule::IdList {
                empty_message: "Provide at least one report id.",
            },
        )]);
        let err = schema.parse(&json!({"reportIds": " , \n"})).unwrap_err();
        assert_eq!(err.to_string(), "Provide at least one report id.");
        let err = schema.parse(&json!({"reportIds": ["r1", "r 2"]})).unwrap_err();
        assert_eq!(err.to_string(), "Report IDs must contain valid ids.");
        let parsed = schema.parse(&json!({"reportIds": "r1\nr2"})).unwrap();
        assert_eq!(parsed["reportIds"], json!(["r1", "r2"]));
    }

    #[test]
    fn select_lists_options_in_message() {
        let schema = InputSchema::new(vec![FieldRule::required(
            "status",
            "Status",
            Rule::OneOf(&["ACTIVE", "WATCHED"]),
        )]);
        let err = schema.parse(&json!({"status": "BANNED"})).unwrap_err();
        assert_eq!(err.to_string(), "Status must be one of: ACTIVE, WATCHED.");
        let descriptors = schema.descriptors();
        assert_eq!(descriptors[0].kind, FieldKind::Select);
        assert_eq!(descriptors[0].options, Some(&["ACTIVE", "WATCHED"][..]));
    }

    #[test]
    fn blank_optional_text_is_omitted() {
        let schema = InputSchema::new(vec![FieldRule::optional("note", "Note", Rule::Text { min: 3 })]);
        assert_eq!(schema.parse(&json!({"note": "   "})).unwrap(), json!({}));
    }
}
