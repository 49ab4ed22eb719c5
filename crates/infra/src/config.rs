//! Runtime configuration, loaded once at startup and injected into services.

use anyhow::{Context, bail};
use chrono::Duration;

use hrspace_core::page::DEFAULT_PAGE_LIMIT;
use hrspace_observability::{LogConfig, LogFormat};

/// Access tokens live for eight hours unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;

#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens.
    pub access_secret: String,
    /// HS256 key for email confirmation codes.
    pub confirmation_secret: String,
    pub token_ttl: Duration,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("confirmation_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Prefix for links sent in review reminders.
    pub frontend_base_url: String,
    /// Sender shown on self-service password emails.
    pub sender: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    pub default_limit: usize,
}

#[derive(Debug, Clone)]
pub struct HrConfig {
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub paging: PagingConfig,
    pub log: LogConfig,
}

impl HrConfig {
    /// Defaults for everything except the two signing secrets.
    pub fn with_secrets(access_secret: impl Into<String>, confirmation_secret: impl Into<String>) -> Self {
        Self {
            auth: AuthConfig {
                access_secret: access_secret.into(),
                confirmation_secret: confirmation_secret.into(),
                token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            },
            mail: MailConfig {
                frontend_base_url: "http://localhost:3000".to_string(),
                sender: "HRSpace".to_string(),
            },
            paging: PagingConfig {
                default_limit: DEFAULT_PAGE_LIMIT,
            },
            log: LogConfig::default(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => bail!("missing required setting {key}"),
            }
        };

        let mut config = Self::with_secrets(
            required("HRSPACE_JWT_SECRET")?,
            required("HRSPACE_CONFIRMATION_SECRET")?,
        );

        if let Some(hours) = lookup("HRSPACE_TOKEN_TTL_HOURS") {
            let hours: i64 = hours
                .trim()
                .parse()
                .with_context(|| format!("HRSPACE_TOKEN_TTL_HOURS is not a number: {hours}"))?;
            if hours <= 0 {
                bail!("HRSPACE_TOKEN_TTL_HOURS must be positive");
            }
            config.auth.token_ttl = Duration::hours(hours);
        }
        if let Some(url) = lookup("HRSPACE_FRONTEND_URL") {
            config.mail.frontend_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(sender) = lookup("HRSPACE_MAIL_SENDER") {
            config.mail.sender = sender;
        }
        if let Some(limit) = lookup("HRSPACE_PAGE_LIMIT") {
            let limit: usize = limit
                .trim()
                .parse()
                .with_context(|| format!("HRSPACE_PAGE_LIMIT is not a number: {limit}"))?;
            if limit == 0 {
                bail!("HRSPACE_PAGE_LIMIT must be positive");
            }
            config.paging.default_limit = limit;
        }
        if let Some(filter) = lookup("HRSPACE_LOG") {
            config.log.filter = filter;
        }
        if let Some(format) = lookup("HRSPACE_LOG_FORMAT") {
            config.log.format = match format.trim() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                other => bail!("unknown HRSPACE_LOG_FORMAT '{other}'"),
            };
        }

        Ok(config)
    }
}
