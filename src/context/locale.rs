//! Display language preference
//!
//! Hydrated once at startup from the persisted preference (or the system
//! locale), then changed only through [`LocaleStore::set`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("Failed to persist language preference: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported interface languages
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ar,
    Zh,
    Ja,
    Hi,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ar => "ar",
            Self::Zh => "zh",
            Self::Ja => "ja",
            Self::Hi => "hi",
        }
    }

    /// Parse a locale tag such as `es`, `es-MX` or `pt_BR.UTF-8` by its primary subtag
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        Self::all().iter().copied().find(|l| l.as_str() == primary)
    }

    pub fn all() -> &'static [Language] {
        &[
            Self::En,
            Self::Es,
            Self::Fr,
            Self::De,
            Self::It,
            Self::Pt,
            Self::Ar,
            Self::Zh,
            Self::Ja,
            Self::Hi,
        ]
    }

    /// Right-to-left script
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::Ar)
    }

    /// Value for a document `dir` attribute
    pub fn direction(&self) -> &'static str {
        if self.is_rtl() {
            "rtl"
        } else {
            "ltr"
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-wide language preference backed by a small file
pub struct LocaleStore {
    path: Option<PathBuf>,
    current: RwLock<Language>,
}

impl LocaleStore {
    /// `<config_dir>/med8d/language`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("med8d").join("language"))
    }

    /// Load the stored preference; otherwise use the system tag if supported; otherwise English
    pub fn hydrate(path: Option<PathBuf>, system_tag: Option<&str>) -> Self {
        let stored = path
            .as_ref()
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|s| Language::from_tag(&s));

        let language = match stored {
            Some(lang) => {
                tracing::debug!(language = %lang, "Loaded stored language");
                lang
            }
            None => system_tag.and_then(Language::from_tag).unwrap_or_default(),
        };

        Self {
            path,
            current: RwLock::new(language),
        }
    }

    /// A store that never touches disk
    pub fn in_memory(language: Language) -> Self {
        Self {
            path: None,
            current: RwLock::new(language),
        }
    }

    pub fn current(&self) -> Language {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the language and persist it
    pub fn set(&self, language: Language) -> Result<(), LocaleError> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = language;

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, language.as_str())?;
            tracing::info!(language = %language, "Language preference saved");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Language::from_tag("es-MX"), Some(Language::Es));
        assert_eq!(Language::from_tag("pt_BR.UTF-8"), Some(Language::Pt));
        assert_eq!(Language::from_tag("AR"), Some(Language::Ar));
        assert_eq!(Language::from_tag("ko-KR"), None);
        assert_eq!(Language::from_tag(""), None);
    }

    #[test]
    fn test_only_arabic_is_rtl() {
        for lang in Language::all() {
            assert_eq!(lang.is_rtl(), *lang == Language::Ar);
        }
        assert_eq!(Language::Ar.direction(), "rtl");
    }

    #[test]
    fn test_hydrate_prefers_stored_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("language");
        fs::write(&path, "fr").unwrap();

        let store = LocaleStore::hydrate(Some(path), Some("de-DE"));
        assert_eq!(store.current(), Language::Fr);
    }

    #[test]
    fn test_hydrate_falls_back_to_system_then_english() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("language");

        let store = LocaleStore::hydrate(Some(missing.clone()), Some("ja_JP.UTF-8"));
        assert_eq!(store.current(), Language::Ja);

        let store = LocaleStore::hydrate(Some(missing), Some("ko_KR"));
        assert_eq!(store.current(), Language::En);
    }

    #[test]
    fn test_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("language");

        let store = LocaleStore::hydrate(Some(path.clone()), None);
        store.set(Language::Hi).unwrap();
        assert_eq!(store.current(), Language::Hi);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hi");

        let reloaded = LocaleStore::hydrate(Some(path), None);
        assert_eq!(reloaded.current(), Language::Hi);
    }
}
