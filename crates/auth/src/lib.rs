//! `hrspace-auth` — authentication capabilities and the role policy evaluator.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod claims;
pub mod credentials;
pub mod policy;
pub mod roles;
pub mod tokens;

pub use actor::Actor;
pub use claims::{AccessClaims, ConfirmationClaims, TokenValidationError, validate_claims};
pub use credentials::{Argon2Hasher, CredentialHasher, generate_password};
pub use policy::{
    AuthzError, FilterCondition, FilterField, ListFilters, Operation, PolicySubject, ResolvedFilter,
    ResourceKind, Scope, authorize_target, ensure_granted, resolve_list,
};
pub use roles::Role;
pub use tokens::{JwtCodec, TokenCodec, TokenError};
