//! Process-wide ambient state
//!
//! Built once at startup and handed to consumers as `Arc<AppContext>`:
//! - display language (persisted)
//! - bearer token (in memory)

mod auth;
mod locale;

pub use auth::AuthState;
pub use locale::{Language, LocaleError, LocaleStore};

/// Shared language and auth state
pub struct AppContext {
    pub locale: LocaleStore,
    pub auth: AuthState,
}

impl AppContext {
    /// Hydrate from the persisted language preference and the given system locale tag
    pub fn hydrate(system_tag: Option<&str>) -> Self {
        Self {
            locale: LocaleStore::hydrate(LocaleStore::default_path(), system_tag),
            auth: AuthState::default(),
        }
    }

    /// Context with nothing persisted, for tests and one-off tools
    pub fn ephemeral(language: Language) -> Self {
        Self {
            locale: LocaleStore::in_memory(language),
            auth: AuthState::default(),
        }
    }

    pub fn language(&self) -> Language {
        self.locale.current()
    }
}
