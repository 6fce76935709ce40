//! Supported menu languages and multilingual text.

use serde::{Deserialize, Serialize};

/// A menu language.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Fr,
    #[default]
    En,
    Th,
    Ru,
    De,
}

impl Locale {
    pub const ALL: [Locale; 5] = [Locale::Fr, Locale::En, Locale::Th, Locale::Ru, Locale::De];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
            Locale::Th => "th",
            Locale::Ru => "ru",
            Locale::De => "de",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(Locale::Fr),
            "en" => Some(Locale::En),
            "th" => Some(Locale::Th),
            "ru" => Some(Locale::Ru),
            "de" => Some(Locale::De),
            _ => None,
        }
    }
}

/// The same text in every supported language.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LocalizedText {
    #[serde(default)]
    pub fr: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub th: String,
    #[serde(default)]
    pub ru: String,
    #[serde(default)]
    pub de: String,
}

impl LocalizedText {
    /// Text in `locale`, falling back to English when that translation is blank.
    pub fn get(&self, locale: Locale) -> &str {
        let text = self.raw(locale);
        if text.trim().is_empty() {
            &self.en
        } else {
            text
        }
    }

    fn raw(&self, locale: Locale) -> &str {
        match locale {
            Locale::Fr => &self.fr,
            Locale::En => &self.en,
            Locale::Th => &self.th,
            Locale::Ru => &self.ru,
            Locale::De => &self.de,
        }
    }

    /// Locales whose translation is empty or whitespace.
    pub fn missing_locales(&self) -> Vec<Locale> {
        Locale::ALL
            .into_iter()
            .filter(|l| self.raw(*l).trim().is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_locales().is_empty()
    }

    /// All translations joined by spaces, for indexing.
    pub fn joined(&self) -> String {
        Locale::ALL
            .iter()
            .map(|l| self.raw(*l))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fails with a message naming `field` and every missing locale.
    pub fn require_complete(&self, field: &str) -> Result<(), String> {
        let missing = self.missing_locales();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|l| l.as_str()).collect();
        Err(format!("{} is missing translations: {}", field, names.join(", ")))
    }

    #[cfg(test)]
    pub fn uniform(text: &str) -> Self {
        Self {
            fr: format!("{} (fr)", text),
            en: text.to_string(),
            th: format!("{} (th)", text),
            ru: format!("{} (ru)", text),
            de: format!("{} (de)", text),
        }
    }
}
