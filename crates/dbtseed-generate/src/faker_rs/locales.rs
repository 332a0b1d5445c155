use std::fmt;

use crate::errors::GenerationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocaleKey {
    EnUs,
    PtBr,
}

impl LocaleKey {
    /// Accepts `en_US`-style names as well as short and hyphenated forms.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().replace('-', "_").to_lowercase().as_str() {
            "en_us" | "en" => Some(Self::EnUs),
            "pt_br" | "pt" => Some(Self::PtBr),
            _ => None,
        }
    }

    pub fn resolve(value: &str) -> Result<Self, GenerationError> {
        Self::parse(value).ok_or_else(|| {
            GenerationError::Configuration(format!("unsupported locale '{value}'"))
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::PtBr => "pt_BR",
        }
    }
}

impl fmt::Display for LocaleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
