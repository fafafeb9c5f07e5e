//! Output schemas for model extraction
//!
//! The generative backend is an untrusted producer: everything it
//! returns is checked against a declared schema before any field
//! crosses into the trusted domain. Each schema designates one anchor
//! field whose absence (or type mismatch) invalidates the whole record;
//! any other mismatched field is dropped rather than trusted.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Declared type of a schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    /// A string holding a `YYYY-MM-DD` calendar date
    Date,
    /// A list whose elements each conform to the nested schema
    List(Box<RecordSchema>),
}

impl FieldKind {
    /// Human-readable type name for prompt rendering
    pub fn describe(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Date => "date string in YYYY-MM-DD format".to_string(),
            FieldKind::List(item) => format!("array of {} objects", item.name),
        }
    }
}

/// One named field in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
        }
    }
}

/// The schema a structured extraction result must conform to
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// Name used in prompts and error messages (e.g. "payslip")
    pub name: String,
    pub fields: Vec<FieldSpec>,
    /// The mandatory anchor field: missing or mistyped means the whole
    /// record is rejected, never a partial result.
    pub anchor: String,
}

impl RecordSchema {
    /// Validate one candidate record against this schema.
    ///
    /// Returns the cleaned record: fields that match their declared
    /// type are kept, mismatched or undeclared fields are dropped. If
    /// the anchor field is absent or mistyped the whole record fails
    /// with `ModelOutputInvalid`.
    pub fn validate_record(&self, candidate: &Value) -> Result<Map<String, Value>> {
        let object = candidate.as_object().ok_or_else(|| {
            Error::ModelOutputInvalid(format!("{}: expected a JSON object", self.name))
        })?;

        let mut cleaned = Map::new();
        for field in &self.fields {
            let Some(raw) = object.get(&field.name) else {
                if field.name == self.anchor {
                    return Err(Error::ModelOutputInvalid(format!(
                        "{}: anchor field '{}' is missing",
                        self.name, self.anchor
                    )));
                }
                continue;
            };

            match coerce(raw, &field.kind) {
                Some(value) => {
                    cleaned.insert(field.name.clone(), value);
                }
                None => {
                    if field.name == self.anchor {
                        return Err(Error::ModelOutputInvalid(format!(
                            "{}: anchor field '{}' has wrong type: {}",
                            self.name, self.anchor, raw
                        )));
                    }
                    debug!(
                        schema = %self.name,
                        field = %field.name,
                        "Dropping mistyped field from model output"
                    );
                }
            }
        }

        Ok(cleaned)
    }
}

/// Check a raw value against a declared kind, normalizing where the
/// check itself implies a canonical form (null counts as absent).
fn coerce(raw: &Value, kind: &FieldKind) -> Option<Value> {
    if raw.is_null() {
        return None;
    }
    match kind {
        FieldKind::String => raw.as_str().map(|s| Value::from(s.to_string())),
        FieldKind::Number => raw.as_f64().map(Value::from),
        FieldKind::Integer => raw.as_i64().map(Value::from),
        FieldKind::Boolean => raw.as_bool().map(Value::from),
        FieldKind::Date => {
            let s = raw.as_str()?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(Value::from(s.to_string()))
        }
        FieldKind::List(item_schema) => {
            let items = raw.as_array()?;
            // Inside a nested list, bad elements are dropped rather
            // than failing the containing record.
            let validated: Vec<Value> = items
                .iter()
                .filter_map(|item| item_schema.validate_record(item).ok())
                .map(Value::Object)
                .collect();
            Some(Value::from(validated))
        }
    }
}

/// Schema for payslip extraction. Anchor: `net_pay`.
pub fn payslip_schema() -> RecordSchema {
    RecordSchema {
        name: "payslip".to_string(),
        fields: vec![
            FieldSpec::new("net_pay", FieldKind::Number, true),
            FieldSpec::new("gross_pay", FieldKind::Number, false),
            FieldSpec::new("employer", FieldKind::String, false),
            FieldSpec::new("pay_date", FieldKind::Date, false),
            FieldSpec::new("deductions", FieldKind::Number, false),
        ],
        anchor: "net_pay".to_string(),
    }
}

/// Schema for a single bank-statement transaction. Anchor: `amount`.
pub fn transaction_schema() -> RecordSchema {
    RecordSchema {
        name: "transaction".to_string(),
        fields: vec![
            FieldSpec::new("amount", FieldKind::Number, true),
            FieldSpec::new("date", FieldKind::Date, false),
            FieldSpec::new("description", FieldKind::String, false),
            FieldSpec::new("category", FieldKind::String, false),
        ],
        anchor: "amount".to_string(),
    }
}

/// Schema for one budget suggestion. Anchor: `monthly_limit`.
pub fn budget_suggestion_schema() -> RecordSchema {
    RecordSchema {
        name: "budget_suggestion".to_string(),
        fields: vec![
            FieldSpec::new("category", FieldKind::String, true),
            FieldSpec::new("monthly_limit", FieldKind::Number, true),
            FieldSpec::new("justification", FieldKind::String, true),
        ],
        anchor: "monthly_limit".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payslip_passes() {
        let schema = payslip_schema();
        let cleaned = schema
            .validate_record(&json!({
                "net_pay": 2450.75,
                "gross_pay": 3200.0,
                "employer": "Acme GmbH",
                "pay_date": "2026-07-31"
            }))
            .unwrap();
        assert_eq!(cleaned["net_pay"], json!(2450.75));
        assert_eq!(cleaned["employer"], json!("Acme GmbH"));
    }

    #[test]
    fn test_missing_anchor_fails_whole_record() {
        let schema = payslip_schema();
        let err = schema
            .validate_record(&json!({"gross_pay": 3200.0, "employer": "Acme GmbH"}))
            .unwrap_err();
        assert!(matches!(err, Error::ModelOutputInvalid(_)));
    }

    #[test]
    fn test_mistyped_anchor_fails_whole_record() {
        let schema = payslip_schema();
        let err = schema
            .validate_record(&json!({"net_pay": "two thousand"}))
            .unwrap_err();
        assert!(matches!(err, Error::ModelOutputInvalid(_)));
    }

    #[test]
    fn test_mistyped_optional_field_is_dropped_not_fatal() {
        let schema = payslip_schema();
        let cleaned = schema
            .validate_record(&json!({"net_pay": 2450.0, "pay_date": "end of July"}))
            .unwrap();
        assert_eq!(cleaned["net_pay"], json!(2450.0));
        assert!(!cleaned.contains_key("pay_date"));
    }

    #[test]
    fn test_undeclared_fields_are_dropped() {
        let schema = transaction_schema();
        let cleaned = schema
            .validate_record(&json!({"amount": -12.5, "iban": "DE00 1234"}))
            .unwrap();
        assert!(!cleaned.contains_key("iban"));
    }

    #[test]
    fn test_non_object_rejected() {
        let schema = transaction_schema();
        assert!(schema.validate_record(&json!([1, 2, 3])).is_err());
        assert!(schema.validate_record(&json!("amount: 5")).is_err());
    }

    #[test]
    fn test_date_format_enforced() {
        let schema = transaction_schema();
        let cleaned = schema
            .validate_record(&json!({"amount": -9.99, "date": "31/07/2026"}))
            .unwrap();
        assert!(!cleaned.contains_key("date"));

        let cleaned = schema
            .validate_record(&json!({"amount": -9.99, "date": "2026-07-31"}))
            .unwrap();
        assert_eq!(cleaned["date"], json!("2026-07-31"));
    }

    #[test]
    fn test_null_anchor_counts_as_missing() {
        let schema = transaction_schema();
        assert!(schema.validate_record(&json!({"amount": null})).is_err());
    }

    #[test]
    fn test_nested_list_drops_bad_elements() {
        let schema = RecordSchema {
            name: "statement".to_string(),
            fields: vec![
                FieldSpec::new("account", FieldKind::String, true),
                FieldSpec::new(
                    "transactions",
                    FieldKind::List(Box::new(transaction_schema())),
                    false,
                ),
            ],
            anchor: "account".to_string(),
        };
        let cleaned = schema
            .validate_record(&json!({
                "account": "main",
                "transactions": [
                    {"amount": -10.0},
                    {"amount": "bogus"},
                    {"amount": 25.0}
                ]
            }))
            .unwrap();
        assert_eq!(cleaned["transactions"].as_array().unwrap().len(), 2);
    }
}
