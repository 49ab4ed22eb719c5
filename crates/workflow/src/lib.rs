//! Paperwork, review and template rules.
//!
//! Deterministic domain logic only. Cross-record sequencing (back-references,
//! compensation) lives in `hrspace-infra`.

pub mod paperwork;
pub mod review;
pub mod template;

pub use paperwork::{
    NewPaperwork, Paperwork, PaperworkAccess, PaperworkStatus, PaperworkType, PaperworkUpdate,
};
pub use review::{ExtendTime, NewReview, Review, ReviewAccess, ReviewDecision, ReviewUpdate, Score};
pub use template::{NewTemplate, Template, TemplateCategory, TemplateUpdate};
