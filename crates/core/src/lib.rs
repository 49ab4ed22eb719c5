//! `hrspace-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod response;
pub mod state;
pub mod value_object;

pub use entity::Entity;
pub use error::{AuthFailure, DomainError, DomainResult};
pub use id::{CompanyId, EmployeeId, PaperworkId, ReviewId, TemplateId};
pub use page::{Page, PageRequest};
pub use response::ApiResponse;
pub use state::RecordState;
pub use value_object::{DateRange, Email, ValueObject};
