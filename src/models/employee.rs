use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw field name of the employee age
pub const AGE: &str = "Age";

/// Raw field name of the length of service (years)
pub const LENGTH_SERVICE: &str = "LengthService";

/// Column the predicted hours are stored under for the clustering stage
pub const ABSENT_HOURS: &str = "AbsentHours";

/// One employee record as posted to the prediction endpoint.
///
/// `Age` and `LengthService` are typed; every other field lands in
/// `attributes` and is treated as categorical (strings) or numeric
/// (numbers, booleans) during encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(rename = "Age", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<NumericInput>,

    #[serde(
        rename = "LengthService",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub length_service: Option<NumericInput>,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl EmployeeRecord {
    pub fn new(age: f64, length_service: f64) -> Self {
        Self {
            age: Some(NumericInput::Number(age)),
            length_service: Some(NumericInput::Number(length_service)),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Parsed `Age`, `None` when absent or null
    pub fn age(&self) -> Result<Option<f64>> {
        self.age.as_ref().map(|v| v.parse(AGE)).transpose()
    }

    /// Parsed `LengthService`, `None` when absent or null
    pub fn length_service(&self) -> Result<Option<f64>> {
        self.length_service
            .as_ref()
            .map(|v| v.parse(LENGTH_SERVICE))
            .transpose()
    }
}

/// A numeric input that may arrive as a JSON number or a numeric string.
/// Any other JSON value is kept so it can be rejected as a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumericInput {
    fn parse(&self, field: &str) -> Result<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                AppError::Validation(format!("{field} must be numeric, got {s:?}"))
            })?,
            NumericInput::Other(other) => {
                return Err(AppError::Validation(format!(
                    "{field} must be numeric, got {other}"
                )));
            }
        };

        if !value.is_finite() {
            return Err(AppError::Validation(format!(
                "{field} must be a finite number"
            )));
        }

        Ok(value)
    }
}

/// Value of a non-core attribute. Arrays and objects land in `Nested` and
/// are rejected during encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
    Nested(serde_json::Value),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}
