//! Application state.

use std::sync::Arc;

use rimborsi_store::{ArchiveExporter, EntryStore, KvStore, PeopleRegistry};

use crate::auth::AuthGate;
use crate::config::ServiceConfig;
use crate::rate_limit::{FixedWindowLimiter, RateLimiter};

/// Application state shared across handlers.
pub struct AppState {
    /// People roster.
    pub people: PeopleRegistry,

    /// Entry buckets and attachments.
    pub entries: EntryStore,

    /// Paginated zip export.
    pub exporter: ArchiveExporter,

    /// Rate limiting and bearer-token check.
    pub auth: AuthGate,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create application state with in-process rate limiters built from
    /// `config`.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: ServiceConfig) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
        ));
        let strict_limiter = Arc::new(FixedWindowLimiter::new(
            config.strict_rate_limit_requests,
            config.strict_rate_limit_window(),
        ));

        Self::with_limiters(store, config, limiter, strict_limiter)
    }

    /// Create application state with caller-supplied rate limiters.
    #[must_use]
    pub fn with_limiters(
        store: Arc<dyn KvStore>,
        config: ServiceConfig,
        limiter: Arc<dyn RateLimiter>,
        strict_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        if config.auth_token.is_empty() {
            tracing::warn!("AUTH_TOKEN not configured - every API request will be rejected");
        }
        if config.admin_token.is_empty() {
            tracing::warn!("ADMIN_TOKEN not configured - the people roster cannot be replaced");
        }

        let people = PeopleRegistry::new(store.clone(), config.admin_token.clone());
        let entries = EntryStore::with_max_entry_bytes(store, config.max_entry_bytes);
        let exporter = ArchiveExporter::new(entries.clone(), config.export_limits());
        let auth = AuthGate::new(config.auth_token.clone(), limiter, strict_limiter);

        Self {
            people,
            entries,
            exporter,
            auth,
            config,
        }
    }
}
