use crate::config::ValidationPolicy;
use crate::error::{AppError, Result};
use crate::models::{AttributeValue, EmployeeRecord, AGE, LENGTH_SERVICE};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

/// Length of service (years) below which an employee counts as short-service
pub const SHORT_SERVICE_YEARS: f64 = 2.0;

pub const SERVICE_PER_AGE: &str = "ServicePerAge";
pub const SERVICE_SQUARED: &str = "ServiceSquared";
pub const AGE_SQUARED: &str = "AgeSquared";
pub const AGE_X_SERVICE: &str = "Age_x_Service";
pub const AGE_DIV_SERVICE: &str = "AgeDivService";
pub const IS_SHORT_SERVICE: &str = "IsShortService";

/// The six features derived from `Age` and `LengthService`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub service_per_age: f64,
    pub service_squared: f64,
    pub age_squared: f64,
    pub age_x_service: f64,
    pub age_div_service: f64,
    pub is_short_service: u8,
}

impl DerivedFeatures {
    /// Compute the derived features. Ratios are left as IEEE results, so a
    /// zero denominator yields a non-finite value; see [`Self::undefined`].
    pub fn compute(age: f64, length_service: f64) -> Self {
        Self {
            service_per_age: length_service / age,
            service_squared: length_service.powi(2),
            age_squared: age.powi(2),
            age_x_service: age * length_service,
            age_div_service: age / (length_service + 1.0),
            is_short_service: u8::from(length_service < SHORT_SERVICE_YEARS),
        }
    }

    /// Column name and value pairs, in derivation order
    pub fn columns(&self) -> [(&'static str, f64); 6] {
        [
            (SERVICE_PER_AGE, self.service_per_age),
            (SERVICE_SQUARED, self.service_squared),
            (AGE_SQUARED, self.age_squared),
            (AGE_X_SERVICE, self.age_x_service),
            (AGE_DIV_SERVICE, self.age_div_service),
            (IS_SHORT_SERVICE, f64::from(self.is_short_service)),
        ]
    }

    /// Names of features whose value is NaN or infinite
    pub fn undefined(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
            .collect()
    }

    fn replace_undefined(&mut self, sentinel: f64) {
        for slot in [
            &mut self.service_per_age,
            &mut self.service_squared,
            &mut self.age_squared,
            &mut self.age_x_service,
            &mut self.age_div_service,
        ] {
            if !slot.is_finite() {
                *slot = sentinel;
            }
        }
    }

    fn get(&self, name: &str) -> Option<f64> {
        self.columns()
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| *value)
    }
}

/// A record after feature derivation and one-hot encoding, before alignment
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub age: f64,
    pub length_service: f64,
    pub derived: DerivedFeatures,
    /// Remaining numeric attributes and one-hot columns (`Field_value`)
    pub encoded: BTreeMap<String, f64>,
}

impl EncodedRecord {
    /// Look up a numeric column by name
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            AGE => Some(self.age),
            LENGTH_SERVICE => Some(self.length_service),
            _ => self
                .derived
                .get(name)
                .or_else(|| self.encoded.get(name).copied()),
        }
    }

    /// Every column the encoded record carries
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![AGE.to_string(), LENGTH_SERVICE.to_string()];
        names.extend(self.derived.columns().iter().map(|(n, _)| n.to_string()));
        names.extend(self.encoded.keys().cloned());
        names
    }
}

/// Ordered list of columns the regressor was trained on
#[derive(Debug, Clone)]
pub struct TrainingSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl TrainingSchema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(AppError::artifact(
                "training columns",
                "schema must list at least one column",
            ));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), position).is_some() {
                return Err(AppError::artifact(
                    "training columns",
                    format!("duplicate column {column:?}"),
                ));
            }
        }

        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Reindex an encoded record onto the schema: missing columns are zero,
    /// columns outside the schema are dropped.
    pub fn align(&self, record: &EncodedRecord) -> Array1<f64> {
        self.columns
            .iter()
            .map(|column| record.get(column).unwrap_or(0.0))
            .collect()
    }
}

/// One row aligned to the training schema
#[derive(Debug, Clone)]
pub struct AlignedRow {
    pub encoded: EncodedRecord,
    pub values: Array1<f64>,
}

/// Turns raw employee records into schema-aligned feature rows
#[derive(Debug, Clone)]
pub struct FeatureTransformer {
    schema: Arc<TrainingSchema>,
    policy: ValidationPolicy,
}

impl FeatureTransformer {
    pub fn new(schema: Arc<TrainingSchema>, policy: ValidationPolicy) -> Self {
        Self { schema, policy }
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Derive features and one-hot encode a record
    pub fn encode(&self, record: &EmployeeRecord) -> Result<EncodedRecord> {
        let age = self.required(AGE, record.age()?)?;
        let length_service = self.required(LENGTH_SERVICE, record.length_service()?)?;

        let mut derived = DerivedFeatures::compute(age, length_service);
        let undefined = derived.undefined();
        if !undefined.is_empty() {
            match self.policy {
                ValidationPolicy::Strict => {
                    return Err(AppError::DegenerateInput(format!(
                        "{} undefined for Age={age}, LengthService={length_service}",
                        undefined.join(", ")
                    )));
                }
                ValidationPolicy::Lenient => {
                    warn!(
                        features = ?undefined,
                        age,
                        length_service,
                        "Undefined derived features replaced with 0.0"
                    );
                    derived.replace_undefined(0.0);
                }
            }
        }

        Ok(EncodedRecord {
            age,
            length_service,
            derived,
            encoded: one_hot_encode(&record.attributes)?,
        })
    }

    /// Encode a record and align it to the training schema
    pub fn transform(&self, record: &EmployeeRecord) -> Result<AlignedRow> {
        let encoded = self.encode(record)?;
        let values = self.schema.align(&encoded);
        Ok(AlignedRow { encoded, values })
    }

    fn required(&self, field: &str, value: Option<f64>) -> Result<f64> {
        match (value, self.policy) {
            (Some(v), _) => Ok(v),
            (None, ValidationPolicy::Strict) => Err(AppError::missing_field(field)),
            (None, ValidationPolicy::Lenient) => {
                warn!(field, "Missing field defaulted to 0.0");
                Ok(0.0)
            }
        }
    }
}

/// Strings become `Field_value` indicator columns, numbers and booleans keep
/// their own column, nulls contribute nothing. Arrays and objects are rejected.
pub fn one_hot_encode(
    attributes: &BTreeMap<String, AttributeValue>,
) -> Result<BTreeMap<String, f64>> {
    let mut encoded = BTreeMap::new();

    for (name, value) in attributes {
        match value {
            AttributeValue::Text(text) => {
                encoded.insert(format!("{name}_{text}"), 1.0);
            }
            AttributeValue::Number(n) => {
                encoded.insert(name.clone(), *n);
            }
            AttributeValue::Bool(b) => {
                encoded.insert(name.clone(), if *b { 1.0 } else { 0.0 });
            }
            AttributeValue::Null => {}
            AttributeValue::Nested(_) => {
                return Err(AppError::Validation(format!(
                    "{name} must be a string, number, boolean or null"
                )));
            }
        }
    }

    Ok(encoded)
}
