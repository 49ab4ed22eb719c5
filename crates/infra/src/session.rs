//! Login and bearer-token authentication.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use hrspace_auth::{AccessClaims, Actor};
use hrspace_core::{AuthFailure, DomainError, DomainResult, Email};
use hrspace_directory::User;

use crate::context::HrContext;

/// Credential plus a fresh access token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub user: User,
    pub access_token: String,
}

/// Sign an access token for `user`, valid for the configured lifetime.
pub fn issue_access_token(ctx: &HrContext, user: &User, now: DateTime<Utc>) -> DomainResult<String> {
    let claims = AccessClaims::new(user.id, user.company_id, now, ctx.config.auth.token_ttl);
    Ok(ctx.tokens.sign_access(&claims)?)
}

pub struct SessionService {
    ctx: HrContext,
}

impl SessionService {
    pub fn new(ctx: HrContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, email: &str, password: &str) -> DomainResult<SignedIn> {
        let invalid = || DomainError::Unauthenticated(AuthFailure::Invalid);

        let email = Email::parse(email)?;
        let user = self
            .ctx
            .store
            .user_by_email(&email)?
            .filter(User::can_login)
            .ok_or_else(invalid)?;

        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !self.ctx.hasher.verify(password, hash) {
            debug!(user = %user.id, "wrong password");
            return Err(invalid());
        }

        let access_token = issue_access_token(&self.ctx, &user, Utc::now())?;
        info!(user = %user.id, company = %user.company_id, "login succeeded");
        Ok(SignedIn { user, access_token })
    }

    /// Resolve an `Authorization` header value into the acting identity.
    ///
    /// Role and department are read from the current profile, not the token.
    pub fn authenticate(&self, header: Option<&str>, now: DateTime<Utc>) -> DomainResult<Actor> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Err(DomainError::Unauthenticated(AuthFailure::Missing));
        };
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        let claims = self.ctx.tokens.verify_access(token, now)?;
        let employee = self
            .ctx
            .store
            .employee_in(claims.company_id, claims.sub)
            .map_err(|_| DomainError::Unauthenticated(AuthFailure::Invalid))?;

        Ok(employee.actor())
    }
}
