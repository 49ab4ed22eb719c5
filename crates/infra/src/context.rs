//! Shared handles injected into every service.

use std::sync::Arc;

use hrspace_auth::{Argon2Hasher, CredentialHasher, JwtCodec, TokenCodec};
use hrspace_core::PageRequest;

use crate::config::HrConfig;
use crate::notify::{Notifier, TracingNotifier};
use crate::store::HrStore;

#[derive(Clone)]
pub struct HrContext {
    pub store: Arc<HrStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenCodec>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<HrConfig>,
}

impl HrContext {
    pub fn new(
        store: Arc<HrStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenCodec>,
        notifier: Arc<dyn Notifier>,
        config: HrConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            notifier,
            config: Arc::new(config),
        }
    }

    /// Production wiring: argon2 hashing, HS256 tokens, logged notices.
    pub fn from_config(config: HrConfig) -> Self {
        let tokens = JwtCodec::new(
            config.auth.access_secret.as_bytes(),
            config.auth.confirmation_secret.as_bytes(),
        );
        Self::new(
            Arc::new(HrStore::new()),
            Arc::new(Argon2Hasher),
            Arc::new(tokens),
            Arc::new(TracingNotifier),
            config,
        )
    }

    /// Load configuration from the environment, install the log subscriber,
    /// and wire the production context.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = HrConfig::from_env()?;
        hrspace_observability::init_with(&config.log);
        tracing::info!(
            page_limit = config.paging.default_limit,
            token_ttl_hours = config.auth.token_ttl.num_hours(),
            "hr context ready"
        );
        Ok(Self::from_config(config))
    }

    /// Page request with the configured default limit.
    pub fn page(&self, page: Option<usize>, limit: Option<usize>) -> PageRequest {
        PageRequest::with_default_limit(page, limit, self.config.paging.default_limit)
    }
}
