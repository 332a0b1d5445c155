use chrono::{NaiveDate, NaiveDateTime};
use fake::Fake;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::GenerationError;
use crate::faker_rs::locales::LocaleKey;
use crate::provider::{Category, ValueKind, ValueProvider, check_probability};
use crate::value::GeneratedValue;

macro_rules! localized {
    ($locale:expr, $rng:expr, $module:ident :: $faker:ident ( $($arg:expr),* )) => {
        match $locale {
            LocaleKey::EnUs => fake::faker::$module::en::$faker($($arg),*).fake_with_rng($rng),
            LocaleKey::PtBr => fake::faker::$module::pt_br::$faker($($arg),*).fake_with_rng($rng),
        }
    };
}

/// Value provider backed by the `fake` crate.
///
/// Seeded providers are reproducible; unseeded ones draw their seed from the
/// thread RNG.
#[derive(Debug, Clone)]
pub struct FakeValueProvider {
    locale: LocaleKey,
    rng: ChaCha8Rng,
}

impl FakeValueProvider {
    pub fn new(locale: &str, seed: Option<u64>) -> Result<Self, GenerationError> {
        let locale = LocaleKey::resolve(locale)?;
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            locale,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    fn generate_value(&mut self, kind: &ValueKind) -> GeneratedValue {
        let locale = self.locale;
        let rng = &mut self.rng;
        match *kind {
            ValueKind::Word => {
                let value: String = localized!(locale, rng, lorem::Word());
                GeneratedValue::Text(value)
            }
            ValueKind::Sentence => {
                let value: String = localized!(locale, rng, lorem::Sentence(3..9));
                GeneratedValue::Text(value)
            }
            ValueKind::Date => {
                let value: NaiveDate = localized!(locale, rng, chrono::Date());
                GeneratedValue::Date(value)
            }
            ValueKind::Timestamp => {
                let value: NaiveDateTime = localized!(locale, rng, chrono::DateTime());
                GeneratedValue::Timestamp(value)
            }
            ValueKind::Integer { min, max } => GeneratedValue::Int(rng.random_range(min..max)),
            ValueKind::Boolean => GeneratedValue::Bool(rng.random_bool(0.5)),
            ValueKind::Uuid => {
                let bytes: [u8; 16] = rng.random();
                let value = uuid::Builder::from_random_bytes(bytes).into_uuid();
                GeneratedValue::Text(value.to_string())
            }
            ValueKind::Category(category) => {
                let value: String = match category {
                    Category::City => localized!(locale, rng, address::CityName()),
                    Category::Country => localized!(locale, rng, address::CountryName()),
                    Category::Street => localized!(locale, rng, address::StreetName()),
                    Category::Postcode => localized!(locale, rng, address::PostCode()),
                    Category::FirstName => localized!(locale, rng, name::FirstName()),
                    Category::LastName => localized!(locale, rng, name::LastName()),
                    Category::FullName => localized!(locale, rng, name::Name()),
                    Category::Email => localized!(locale, rng, internet::SafeEmail()),
                    Category::PhoneNumber => localized!(locale, rng, phone_number::PhoneNumber()),
                    Category::Company => localized!(locale, rng, company::CompanyName()),
                };
                GeneratedValue::Text(value)
            }
        }
    }
}

impl ValueProvider for FakeValueProvider {
    fn produce(
        &mut self,
        kind: &ValueKind,
        count: usize,
        allow_none: Option<f64>,
    ) -> Result<Vec<GeneratedValue>, GenerationError> {
        let null_probability = allow_none.unwrap_or(0.0);
        check_probability("null probability", null_probability)?;
        if let ValueKind::Integer { min, max } = *kind {
            if min >= max {
                return Err(GenerationError::Configuration(format!(
                    "integer bounds must satisfy min < max, got [{min}, {max})"
                )));
            }
        }

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let value = self.generate_value(kind);
            if null_probability > 0.0 && self.rng.random_bool(null_probability) {
                values.push(GeneratedValue::Null);
            } else {
                values.push(value);
            }
        }
        Ok(values)
    }
}
