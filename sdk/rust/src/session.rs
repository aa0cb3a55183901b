use std::sync::RwLock;

/// Authentication state for one signed-in user.
///
/// Shared by reference between calls; clearing it from any call (logout or
/// a 401) makes every later call fail with `NotAuthenticated`.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn logout(&self) {
        self.clear();
    }

    pub(crate) fn clear(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub(crate) fn bearer(&self) -> Option<String> {
        self.token().map(|token| format!("Bearer {token}"))
    }
}
