use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A selectable language and its wire code.
///
/// `Auto` carries the empty code and means "let the service detect the
/// source language". It is only meaningful as a source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Auto,
    Korean,
    English,
    Japanese,
    Chinese,
    German,
    French,
    Spanish,
}

const ALL: [Language; 8] = [
    Language::Auto,
    Language::Korean,
    Language::English,
    Language::Japanese,
    Language::Chinese,
    Language::German,
    Language::French,
    Language::Spanish,
];

impl Language {
    /// Every language in dropdown order, `Auto` first.
    pub fn all() -> &'static [Language] {
        &ALL
    }

    /// Languages valid as a translation target.
    pub fn targets() -> impl Iterator<Item = Language> {
        ALL.iter().copied().filter(|l| !l.is_auto())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Auto => "",
            Language::Korean => "KO",
            Language::English => "EN-US",
            Language::Japanese => "JA",
            Language::Chinese => "ZH",
            Language::German => "DE",
            Language::French => "FR",
            Language::Spanish => "ES",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Auto => "Detect language",
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
            Language::German => "German",
            Language::French => "French",
            Language::Spanish => "Spanish",
        }
    }

    pub fn is_auto(&self) -> bool {
        self.code().is_empty()
    }

    /// Resolve a wire code. Matching is case-insensitive; `""` and `"auto"`
    /// both resolve to `Auto`.
    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("auto") {
            return Some(Language::Auto);
        }
        ALL.iter()
            .copied()
            .find(|l| !l.is_auto() && l.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Source/target selection as shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    #[serde(rename = "source_lang")]
    pub source: Language,
    #[serde(rename = "target_lang")]
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Swap source and target. Does nothing when the source is `Auto`,
    /// since `Auto` cannot become a target.
    pub fn swap(&mut self) -> bool {
        if self.source.is_auto() {
            return false;
        }
        std::mem::swap(&mut self.source, &mut self.target);
        true
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(Language::Auto, Language::English)
    }
}
