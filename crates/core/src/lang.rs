use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display languages supported by the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Portuguese (default).
    #[default]
    Pt,
    /// English.
    En,
}

/// Ordered list of supported languages.
pub const SUPPORTED_LANGUAGES: &[Language] = &[Language::Pt, Language::En];

impl Language {
    /// Returns the canonical language code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
        }
    }

    /// Attempts to parse a language code (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let code = normalized.split(['-', '_']).next().unwrap_or("");
        match code {
            "pt" => Some(Self::Pt),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LOCALIZED TEXT ────────────────────────────────────────────────────────────
//

/// A text field that may carry one string per language.
///
/// Older bank formats store a bare string, which counts as already-resolved
/// text. Any other JSON shape is tolerated and resolves to an empty string.
///
/// Resolution applies the fallback order `requested → pt → en → empty`,
/// falling through only when a key is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    ByLanguage(BTreeMap<String, String>),
    Malformed(serde_json::Value),
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl LocalizedText {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    /// Builds a text field with Portuguese and English variants.
    #[must_use]
    pub fn bilingual(pt: impl Into<String>, en: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Language::Pt.as_str().to_owned(), pt.into());
        map.insert(Language::En.as_str().to_owned(), en.into());
        Self::ByLanguage(map)
    }

    /// Resolves the text for `lang`, falling back to `pt`, then `en`, then empty.
    #[must_use]
    pub fn resolve(&self, lang: Language) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::ByLanguage(map) => map
                .get(lang.as_str())
                .or_else(|| map.get(Language::Pt.as_str()))
                .or_else(|| map.get(Language::En.as_str()))
                .map_or("", String::as_str),
            Self::Malformed(_) => "",
        }
    }
}

//
// ─── LOCALIZED LIST ────────────────────────────────────────────────────────────
//

const EMPTY_LIST: &[String] = &[];

/// An ordered list field that may carry one list per language.
///
/// Same fallback contract as [`LocalizedText`]; a present-but-empty list
/// stops the fallback, only an absent key falls through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedList {
    Plain(Vec<String>),
    ByLanguage(BTreeMap<String, Vec<String>>),
    Malformed(serde_json::Value),
}

impl Default for LocalizedList {
    fn default() -> Self {
        Self::Plain(Vec::new())
    }
}

impl LocalizedList {
    #[must_use]
    pub fn plain(items: Vec<String>) -> Self {
        Self::Plain(items)
    }

    /// Builds a list field with Portuguese and English variants.
    #[must_use]
    pub fn bilingual(pt: Vec<String>, en: Vec<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Language::Pt.as_str().to_owned(), pt);
        map.insert(Language::En.as_str().to_owned(), en);
        Self::ByLanguage(map)
    }

    /// Resolves the list for `lang`, falling back to `pt`, then `en`, then empty.
    #[must_use]
    pub fn resolve(&self, lang: Language) -> &[String] {
        match self {
            Self::Plain(items) => items,
            Self::ByLanguage(map) => map
                .get(lang.as_str())
                .or_else(|| map.get(Language::Pt.as_str()))
                .or_else(|| map.get(Language::En.as_str()))
                .map_or(EMPTY_LIST, Vec::as_slice),
            Self::Malformed(_) => EMPTY_LIST,
        }
    }

    /// Lengths of every language variant that is present.
    #[must_use]
    pub fn lengths(&self) -> Vec<usize> {
        match self {
            Self::Plain(items) => vec![items.len()],
            Self::ByLanguage(map) => map.values().map(Vec::len).collect(),
            Self::Malformed(_) => Vec::new(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
