//! Supported content locales

use serde::{Deserialize, Serialize};

/// Content locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    De,
    En,
    Fr,
    It,
    Es,
    Pl,
    Uk,
    Ru,
    Tr,
    Hi,
    Zh,
    Ar,
}

impl Default for Locale {
    fn default() -> Self {
        Self::De
    }
}

impl Locale {
    /// Convert locale to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::De => "de",
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::It => "it",
            Locale::Es => "es",
            Locale::Pl => "pl",
            Locale::Uk => "uk",
            Locale::Ru => "ru",
            Locale::Tr => "tr",
            Locale::Hi => "hi",
            Locale::Zh => "zh",
            Locale::Ar => "ar",
        }
    }

    /// Parse locale from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "de" => Some(Locale::De),
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            "it" => Some(Locale::It),
            "es" => Some(Locale::Es),
            "pl" => Some(Locale::Pl),
            "uk" => Some(Locale::Uk),
            "ru" => Some(Locale::Ru),
            "tr" => Some(Locale::Tr),
            "hi" => Some(Locale::Hi),
            "zh" => Some(Locale::Zh),
            "ar" => Some(Locale::Ar),
            _ => None,
        }
    }

    /// All supported locales
    pub fn all() -> &'static [Locale] {
        &[
            Locale::De,
            Locale::En,
            Locale::Fr,
            Locale::It,
            Locale::Es,
            Locale::Pl,
            Locale::Uk,
            Locale::Ru,
            Locale::Tr,
            Locale::Hi,
            Locale::Zh,
            Locale::Ar,
        ]
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_roundtrip() {
        for locale in Locale::all() {
            assert_eq!(Locale::from_str(locale.as_str()), Some(*locale));
        }
    }

    #[test]
    fn test_locale_from_str_case_insensitive() {
        assert_eq!(Locale::from_str("DE"), Some(Locale::De));
        assert_eq!(Locale::from_str("En"), Some(Locale::En));
    }

    #[test]
    fn test_locale_from_str_unknown() {
        assert_eq!(Locale::from_str("xx"), None);
        assert_eq!(Locale::from_str(""), None);
    }
}
