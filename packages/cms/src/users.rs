//! Acting-user resolution.

use std::sync::Arc;

use common::config::UserConfig;

/// Supplies the id of the user behind the current request, if any.
pub trait CurrentUserProvider: Send + Sync {
    fn current_user_id(&self) -> Option<i32>;
}

/// Provider for callers that already know who is acting.
#[derive(Debug, Clone, Copy)]
pub struct FixedUserProvider(pub i32);

impl CurrentUserProvider for FixedUserProvider {
    fn current_user_id(&self) -> Option<i32> {
        Some(self.0)
    }
}

/// Picks the user id stamped on nodes and audit entries.
///
/// Precedence: an explicit non-negative id, then the injected provider,
/// then the configured fallback (0, the built-in admin, by default).
#[derive(Clone)]
pub struct UserResolver {
    provider: Option<Arc<dyn CurrentUserProvider>>,
    fallback_user_id: i32,
}

impl std::fmt::Debug for UserResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserResolver")
            .field("has_provider", &self.provider.is_some())
            .field("fallback_user_id", &self.fallback_user_id)
            .finish()
    }
}

impl Default for UserResolver {
    fn default() -> Self {
        Self::new(&UserConfig::default())
    }
}

impl UserResolver {
    pub fn new(config: &UserConfig) -> Self {
        Self {
            provider: None,
            fallback_user_id: config.fallback_user_id,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn CurrentUserProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn resolve(&self, explicit: Option<i32>) -> i32 {
        if let Some(id) = explicit.filter(|id| *id >= 0) {
            return id;
        }
        self.provider
            .as_ref()
            .and_then(|p| p.current_user_id())
            .unwrap_or(self.fallback_user_id)
    }
}
