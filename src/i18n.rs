use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Languages offered by the language selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Pt,
}

impl Language {
    /// Every supported language, in selector order
    pub const ALL: [Language; 2] = [Language::En, Language::Pt];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }

    /// Path of the dictionary served for this language
    pub fn dictionary_path(&self) -> String {
        format!("/static/js/i18n_{}.json", self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "pt" => Ok(Language::Pt),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// A translation dictionary: key to localized text
pub type Dictionary = HashMap<String, String>;

/// Translation dictionaries for every language, built once at startup.
///
/// The value is immutable after construction and is handed to whatever
/// renders UI text. Missing languages and missing keys both resolve to the
/// caller's fallback text.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    dictionaries: HashMap<Language, Dictionary>,
}

impl Translations {
    pub fn new(dictionaries: HashMap<Language, Dictionary>) -> Self {
        Self { dictionaries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up `key` in the dictionary for `language`.
    pub fn get(&self, language: Language, key: &str) -> Option<&str> {
        self.dictionaries
            .get(&language)
            .and_then(|dict| dict.get(key))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    /// Looks up `key`, keeping `fallback` when no translation exists.
    pub fn text<'a>(&'a self, language: Language, key: &str, fallback: &'a str) -> &'a str {
        self.get(language, key).unwrap_or(fallback)
    }

    /// Whether a non-empty dictionary was loaded for `language`
    pub fn has_language(&self, language: Language) -> bool {
        self.dictionaries
            .get(&language)
            .is_some_and(|dict| !dict.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Translations {
        let mut pt = Dictionary::new();
        pt.insert("plot".to_string(), "Plotar".to_string());
        pt.insert("save".to_string(), String::new());
        let mut dictionaries = HashMap::new();
        dictionaries.insert(Language::Pt, pt);
        dictionaries.insert(Language::En, Dictionary::new());
        Translations::new(dictionaries)
    }

    #[test]
    fn lookup_uses_dictionary_then_fallback() {
        let translations = sample();
        assert_eq!(translations.text(Language::Pt, "plot", "Plot"), "Plotar");
        assert_eq!(translations.text(Language::En, "plot", "Plot"), "Plot");
        assert_eq!(translations.text(Language::Pt, "missing", "Missing"), "Missing");
    }

    #[test]
    fn empty_translation_keeps_fallback() {
        assert_eq!(sample().text(Language::Pt, "save", "Save"), "Save");
    }

    #[test]
    fn language_codes_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.code().parse::<Language>(), Ok(language));
        }
        assert_eq!(" PT ".parse::<Language>(), Ok(Language::Pt));
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::En.dictionary_path(), "/static/js/i18n_en.json");
    }

    #[test]
    fn loaded_languages_are_reported() {
        let translations = sample();
        assert!(translations.has_language(Language::Pt));
        assert!(!translations.has_language(Language::En));
        assert!(!Translations::empty().has_language(Language::Pt));
    }
}
