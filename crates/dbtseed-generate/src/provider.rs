use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use dbtseed_core::{Column, DataType};

use crate::errors::GenerationError;
use crate::value::GeneratedValue;

pub const DEFAULT_INT_MIN: i64 = 0;
pub const DEFAULT_INT_MAX: i64 = 10000;

/// Canonical descriptors accepted in `data_type_mapping` and `field_aliases`.
pub const KIND_DESCRIPTORS: &[&str] = &[
    "text.word",
    "text.sentence",
    "datetime.date",
    "datetime.timestamp",
    "integer_number",
    "boolean",
    "uuid",
    "address.city",
    "address.country",
    "address.street_name",
    "address.postal_code",
    "person.first_name",
    "person.last_name",
    "person.full_name",
    "person.email",
    "person.telephone",
    "finance.company",
];

/// Semantic value kind a provider knows how to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Word,
    Sentence,
    Date,
    Timestamp,
    /// Half-open range `[min, max)`.
    Integer { min: i64, max: i64 },
    Boolean,
    Uuid,
    Category(Category),
}

/// Column-specific aliases such as `"city"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    City,
    Country,
    Street,
    Postcode,
    FirstName,
    LastName,
    FullName,
    Email,
    PhoneNumber,
    Company,
}

impl ValueKind {
    /// Parse a kind descriptor. Short aliases (`"city"`, `"date"`) are
    /// accepted next to the canonical dotted names.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, GenerationError> {
        let kind = match descriptor.trim().to_lowercase().as_str() {
            "text.word" | "word" => ValueKind::Word,
            "text.sentence" | "sentence" | "text.text" => ValueKind::Sentence,
            "datetime.date" | "date" => ValueKind::Date,
            "datetime.timestamp" | "datetime.datetime" | "timestamp" | "datetime" => {
                ValueKind::Timestamp
            }
            "integer_number" | "numeric.integer_number" | "integer" => ValueKind::Integer {
                min: DEFAULT_INT_MIN,
                max: DEFAULT_INT_MAX,
            },
            "boolean" | "development.boolean" => ValueKind::Boolean,
            "uuid" | "cryptographic.uuid" => ValueKind::Uuid,
            "address.city" | "city" => ValueKind::Category(Category::City),
            "address.country" | "country" => ValueKind::Category(Category::Country),
            "address.street_name" | "street_name" | "street" => {
                ValueKind::Category(Category::Street)
            }
            "address.postal_code" | "address.zip_code" | "postal_code" | "postcode" => {
                ValueKind::Category(Category::Postcode)
            }
            "person.first_name" | "first_name" => ValueKind::Category(Category::FirstName),
            "person.last_name" | "person.surname" | "last_name" => {
                ValueKind::Category(Category::LastName)
            }
            "person.full_name" | "full_name" | "name" => ValueKind::Category(Category::FullName),
            "person.email" | "email" => ValueKind::Category(Category::Email),
            "person.telephone" | "phone_number" | "telephone" => {
                ValueKind::Category(Category::PhoneNumber)
            }
            "finance.company" | "company" => ValueKind::Category(Category::Company),
            other => {
                return Err(GenerationError::Configuration(format!(
                    "unknown value kind '{other}'"
                )));
            }
        };
        Ok(kind)
    }

    /// Apply explicit integer bounds. Only integer kinds accept them.
    pub fn with_bounds(self, min: Option<i64>, max: Option<i64>) -> Result<Self, GenerationError> {
        if min.is_none() && max.is_none() {
            return Ok(self);
        }
        let ValueKind::Integer {
            min: default_min,
            max: default_max,
        } = self
        else {
            return Err(GenerationError::Configuration(format!(
                "bounds are only supported for integer kinds, got {self:?}"
            )));
        };
        let min = min.unwrap_or(default_min);
        let max = max.unwrap_or(default_max);
        if min >= max {
            return Err(GenerationError::Configuration(format!(
                "integer bounds must satisfy min < max, got [{min}, {max})"
            )));
        }
        Ok(ValueKind::Integer { min, max })
    }
}

/// Kind reference as written in configuration: a bare descriptor or a table
/// with bounds, e.g. `{ kind = "integer_number", min = 0, max = 1000 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindSpec {
    Descriptor(String),
    Detailed {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
}

impl KindSpec {
    pub fn resolve(&self) -> Result<ValueKind, GenerationError> {
        match self {
            KindSpec::Descriptor(descriptor) => ValueKind::from_descriptor(descriptor),
            KindSpec::Detailed { kind, min, max } => {
                ValueKind::from_descriptor(kind)?.with_bounds(*min, *max)
            }
        }
    }
}

impl From<&str> for KindSpec {
    fn from(value: &str) -> Self {
        KindSpec::Descriptor(value.to_string())
    }
}

/// Capability that synthesizes raw values for a kind.
///
/// Providers give no uniqueness guarantee; deduplication happens in the
/// pool manager.
pub trait ValueProvider {
    /// Produce exactly `count` values. With `allow_none = Some(p)` every value
    /// is independently replaced by [`GeneratedValue::Null`] with
    /// probability `p`.
    fn produce(
        &mut self,
        kind: &ValueKind,
        count: usize,
        allow_none: Option<f64>,
    ) -> Result<Vec<GeneratedValue>, GenerationError>;
}

impl<P: ValueProvider + ?Sized> ValueProvider for &mut P {
    fn produce(
        &mut self,
        kind: &ValueKind,
        count: usize,
        allow_none: Option<f64>,
    ) -> Result<Vec<GeneratedValue>, GenerationError> {
        (**self).produce(kind, count, allow_none)
    }
}

pub fn check_probability(name: &str, value: f64) -> Result<(), GenerationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GenerationError::Configuration(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Resolves the value kind for each column.
///
/// Precedence: field alias by column name, then the data type mapping, then
/// the built-in defaults.
#[derive(Debug, Clone)]
pub struct KindResolver {
    by_type: HashMap<String, ValueKind>,
    by_field: HashMap<String, ValueKind>,
}

impl KindResolver {
    pub fn new(
        data_type_mapping: &BTreeMap<String, KindSpec>,
        field_aliases: &BTreeMap<String, KindSpec>,
    ) -> Result<Self, GenerationError> {
        let mut by_type = default_type_mapping();
        for (data_type, spec) in data_type_mapping {
            by_type.insert(DataType::parse(data_type).name(), spec.resolve()?);
        }

        let mut by_field = HashMap::new();
        for (field, spec) in field_aliases {
            by_field.insert(field.clone(), spec.resolve()?);
        }

        Ok(Self { by_type, by_field })
    }

    pub fn resolve(&self, column: &Column) -> Result<ValueKind, GenerationError> {
        if let Some(kind) = self.by_field.get(&column.name) {
            return Ok(*kind);
        }
        let type_name = column.data_type.name();
        self.by_type.get(&type_name).copied().ok_or_else(|| {
            GenerationError::Configuration(format!(
                "no value kind mapped for data type '{}' (column '{}')",
                type_name, column.name
            ))
        })
    }
}

impl Default for KindResolver {
    fn default() -> Self {
        Self {
            by_type: default_type_mapping(),
            by_field: HashMap::new(),
        }
    }
}

fn default_type_mapping() -> HashMap<String, ValueKind> {
    HashMap::from([
        (DataType::Varchar.name(), ValueKind::Word),
        (DataType::Date.name(), ValueKind::Date),
        (
            DataType::Integer.name(),
            ValueKind::Integer {
                min: DEFAULT_INT_MIN,
                max: DEFAULT_INT_MAX,
            },
        ),
        (DataType::Boolean.name(), ValueKind::Boolean),
        (DataType::Timestamp.name(), ValueKind::Timestamp),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_canonical_descriptor_parses() {
        for descriptor in KIND_DESCRIPTORS {
            ValueKind::from_descriptor(descriptor)
                .unwrap_or_else(|err| panic!("{descriptor}: {err}"));
        }
    }

    #[test]
    fn unknown_descriptor_is_configuration_error() {
        let err = ValueKind::from_descriptor("food.dish").unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn bounds_only_apply_to_integers() {
        let spec = KindSpec::Detailed {
            kind: "integer_number".to_string(),
            min: Some(0),
            max: Some(1000),
        };
        assert_eq!(
            spec.resolve().unwrap(),
            ValueKind::Integer { min: 0, max: 1000 }
        );

        let spec = KindSpec::Detailed {
            kind: "city".to_string(),
            min: Some(0),
            max: None,
        };
        assert!(matches!(
            spec.resolve(),
            Err(GenerationError::Configuration(_))
        ));

        let spec = KindSpec::Detailed {
            kind: "integer".to_string(),
            min: Some(5),
            max: Some(5),
        };
        assert!(spec.resolve().is_err());
    }

    #[test]
    fn field_alias_wins_over_type_mapping() {
        let aliases = BTreeMap::from([("OriginCityName".to_string(), KindSpec::from("city"))]);
        let mapping = BTreeMap::from([(
            "integer".to_string(),
            KindSpec::Detailed {
                kind: "integer_number".to_string(),
                min: Some(1),
                max: Some(7),
            },
        )]);
        let resolver = KindResolver::new(&mapping, &aliases).unwrap();

        let city = Column::new("OriginCityName", DataType::Varchar);
        assert_eq!(
            resolver.resolve(&city).unwrap(),
            ValueKind::Category(Category::City)
        );
        let weekday = Column::new("weekday", DataType::Integer);
        assert_eq!(
            resolver.resolve(&weekday).unwrap(),
            ValueKind::Integer { min: 1, max: 7 }
        );
        let word = Column::new("carrier", DataType::Varchar);
        assert_eq!(resolver.resolve(&word).unwrap(), ValueKind::Word);
    }

    #[test]
    fn unmapped_data_type_is_configuration_error() {
        let resolver = KindResolver::default();
        let column = Column::new("fare", DataType::Other("numeric".to_string()));
        assert!(matches!(
            resolver.resolve(&column),
            Err(GenerationError::Configuration(_))
        ));

        let mapping = BTreeMap::from([("NUMERIC".to_string(), KindSpec::from("integer_number"))]);
        let resolver = KindResolver::new(&mapping, &BTreeMap::new()).unwrap();
        assert!(resolver.resolve(&column).is_ok());
    }
}
