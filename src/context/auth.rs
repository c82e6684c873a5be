use std::sync::RwLock;

/// Bearer token supplied by the sign-in flow; held in memory only
#[derive(Default)]
pub struct AuthState {
    token: RwLock<Option<String>>,
}

impl AuthState {
    pub fn login(&self, token: &str) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        tracing::info!("Signed in");
    }

    pub fn logout(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        tracing::info!("Signed out");
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}
