pub mod translations;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use translations::Translations;

/// Site locales. `Bg` is the live public locale; `En` URLs still resolve but
/// are redirected onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Bg,
    En,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::Bg;
    pub const ALL: [Locale; 2] = [Locale::Bg, Locale::En];

    pub fn parse(code: &str) -> Option<Locale> {
        match code {
            "bg" => Some(Locale::Bg),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::Bg => "bg",
            Locale::En => "en",
        }
    }

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A text field stored once per locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub bg: String,
    #[serde(default)]
    pub en: String,
}

impl LocalizedText {
    pub fn new(bg: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            bg: bg.into(),
            en: en.into(),
        }
    }

    /// Text for `locale`, or the default locale's text when that one is blank.
    pub fn get(&self, locale: Locale) -> &str {
        let text = match locale {
            Locale::Bg => &self.bg,
            Locale::En => &self.en,
        };
        if text.trim().is_empty() {
            self.raw(Locale::DEFAULT)
        } else {
            text
        }
    }

    fn raw(&self, locale: Locale) -> &str {
        match locale {
            Locale::Bg => &self.bg,
            Locale::En => &self.en,
        }
    }

    pub fn variants(&self) -> [&str; 2] {
        [&self.bg, &self.en]
    }

    pub fn is_blank(&self) -> bool {
        self.bg.trim().is_empty() && self.en.trim().is_empty()
    }
}
