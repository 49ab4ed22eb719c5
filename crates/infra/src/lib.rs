//! Infrastructure layer: document store, compensation log, config, notices,
//! and the services that sequence multi-record HR operations.

pub mod cascade;
pub mod config;
pub mod context;
pub mod lifecycle;
pub mod notify;
pub mod queries;
pub mod saga;
pub mod session;
pub mod store;
pub mod templates;
pub mod workflow;

mod integration_tests;

pub use config::HrConfig;
pub use context::HrContext;
pub use lifecycle::{LifecycleService, RegisterCompany, Registration};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use queries::QueryService;
pub use saga::Compensations;
pub use session::{SessionService, SignedIn};
pub use store::HrStore;
pub use templates::TemplateService;
pub use workflow::WorkflowService;
