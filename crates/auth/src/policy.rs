//! Role policy evaluator.
//!
//! Visibility and permission rules are data: a table maps
//! `(role, resource, operation)` to the filters a caller may use and the scope
//! the result is narrowed to. One generic evaluator applies the table.
//!
//! - No IO
//! - No panics
//! - No storage types: records are seen through [`PolicySubject`]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hrspace_core::{CompanyId, DomainError, EmployeeId};

use crate::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Employee,
    User,
    Paperwork,
    Review,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Detail,
    Create,
    Update,
    Delete,
    Share,
}

/// Filterable attributes across resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Name,
    Department,
    EmploymentStatus,
    EmploymentType,
    Decision,
    Title,
    Activated,
    Category,
}

impl FilterField {
    /// Free-text fields match case-insensitively by substring; the rest by exact value.
    fn is_text(self) -> bool {
        matches!(self, FilterField::Name | FilterField::Title)
    }
}

/// Filters requested by the caller (field → accepted values).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    entries: BTreeMap<FilterField, Vec<String>>,
}

impl ListFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.add(field, value);
        self
    }

    pub fn add(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.entries.entry(field).or_default().push(value);
    }

    pub fn get(&self, field: FilterField) -> Option<&[String]> {
        self.entries.get(&field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One resolved predicate on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Case-insensitive substring match against the lowercased needle.
    Contains(String),
    /// Exact match against any of the values.
    AnyOf(Vec<String>),
}

impl FilterCondition {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            FilterCondition::Contains(needle) => value.to_lowercase().contains(needle.as_str()),
            FilterCondition::AnyOf(values) => values.iter().any(|v| v == value),
        }
    }
}

/// Narrowing applied on top of the company boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Everything in the company.
    Company,
    /// Only records about this employee.
    Only(EmployeeId),
    /// Records about this employee or about anyone they line-manage.
    SelfOrReports(EmployeeId),
    /// Records whose reviewer is this employee.
    ReviewedBy(EmployeeId),
}

impl Scope {
    fn admits(&self, subject: &impl PolicySubject) -> bool {
        match *self {
            Scope::Company => true,
            Scope::Only(id) => subject.subject_id() == id,
            Scope::SelfOrReports(id) => {
                subject.subject_id() == id || subject.line_manager_id() == Some(id)
            }
            Scope::ReviewedBy(id) => subject.reviewer_id() == Some(id),
        }
    }
}

/// A record as the policy sees it.
pub trait PolicySubject {
    fn company_id(&self) -> CompanyId;

    /// The employee the record is about: the employee itself, a paperwork's
    /// owner, a review's reviewee.
    fn subject_id(&self) -> EmployeeId;

    /// Line manager of the subject employee.
    fn line_manager_id(&self) -> Option<EmployeeId>;

    fn reviewer_id(&self) -> Option<EmployeeId> {
        None
    }

    /// Value of a filterable field, rendered as the transport would send it.
    fn filter_value(&self, field: FilterField) -> Option<String>;
}

/// Output of [`resolve_list`]: company + scope + ANDed conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFilter {
    pub company_id: CompanyId,
    pub scope: Scope,
    pub conditions: Vec<(FilterField, FilterCondition)>,
}

impl ResolvedFilter {
    pub fn matches(&self, subject: &impl PolicySubject) -> bool {
        subject.company_id() == self.company_id
            && self.scope.admits(subject)
            && self
                .conditions
                .iter()
                .all(|(field, cond)| cond.matches(subject.filter_value(*field).as_deref()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("record belongs to another company")]
    OutsideCompany,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            // Do not confirm that another company's record exists.
            AuthzError::OutsideCompany => DomainError::not_found("record does not exist"),
            AuthzError::Forbidden(msg) => DomainError::permission(msg),
            AuthzError::InvalidFilter(msg) => DomainError::validation(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy table
// ─────────────────────────────────────────────────────────────────────────────

/// How a rule narrows the visible set (or which targets it admits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeRule {
    Company,
    OwnRecord,
    OwnOrReports,
    /// Actor must be the subject's line manager.
    ReportsOnly,
    ReviewerIsActor,
    /// Actor must be both the subject's line manager and the record's reviewer.
    ReviewerOfReport,
}

/// What happens to requested filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterMode {
    PassThrough,
    /// Like `PassThrough`, but `department` must equal the actor's own.
    OwnDepartmentOnly,
    Ignore,
}

#[derive(Debug, Clone, Copy)]
struct PolicyRule {
    filters: &'static [FilterField],
    mode: FilterMode,
    scope: ScopeRule,
}

const EMPLOYEE_FILTERS: &[FilterField] = &[
    FilterField::Name,
    FilterField::Department,
    FilterField::EmploymentStatus,
    FilterField::EmploymentType,
];
const USER_FILTERS: &[FilterField] = &[FilterField::Name, FilterField::Activated];
const PAPERWORK_FILTERS: &[FilterField] = &[FilterField::Title];
const REVIEW_FILTERS: &[FilterField] = &[FilterField::Decision, FilterField::Title];
const TEMPLATE_FILTERS: &[FilterField] = &[FilterField::Name, FilterField::Category];

fn filters_for(resource: ResourceKind) -> &'static [FilterField] {
    match resource {
        ResourceKind::Employee => EMPLOYEE_FILTERS,
        ResourceKind::User => USER_FILTERS,
        ResourceKind::Paperwork => PAPERWORK_FILTERS,
        ResourceKind::Review => REVIEW_FILTERS,
        ResourceKind::Template => TEMPLATE_FILTERS,
    }
}

const fn rule(filters: &'static [FilterField], mode: FilterMode, scope: ScopeRule) -> PolicyRule {
    PolicyRule { filters, mode, scope }
}

/// The table. `None` means the operation is not granted to the role.
fn policy_rule(role: Role, resource: ResourceKind, op: Operation) -> Option<PolicyRule> {
    use FilterMode::*;
    use Operation::*;
    use ResourceKind as R;
    use ScopeRule::*;

    let filters = filters_for(resource);
    match (role, resource, op) {
        (Role::Admin, R::Review, Share) => Some(rule(&[], Ignore, ReportsOnly)),
        (Role::Admin, _, Share) => None,
        (Role::Admin, _, _) => Some(rule(filters, PassThrough, Company)),

        (Role::Manager, R::Employee, List) => Some(rule(filters, OwnDepartmentOnly, OwnOrReports)),
        (Role::Manager, R::Employee | R::Paperwork, Detail) => Some(rule(&[], Ignore, OwnOrReports)),
        (Role::Manager, R::Paperwork, List) => Some(rule(filters, PassThrough, OwnOrReports)),
        (Role::Manager, R::Review, List) => Some(rule(filters, PassThrough, ReviewerIsActor)),
        (Role::Manager, R::Review, Detail) => Some(rule(&[], Ignore, ReviewerOfReport)),
        (Role::Manager, R::Review, Update) => Some(rule(&[], Ignore, ReportsOnly)),
        (Role::Manager, R::Review, Share) => Some(rule(&[], Ignore, ReportsOnly)),
        (Role::Manager, R::Template, List | Detail) => Some(rule(filters, PassThrough, Company)),

        (Role::Employee, R::Employee | R::Paperwork | R::Review, List | Detail) => {
            Some(rule(&[], Ignore, OwnRecord))
        }
        (Role::Employee, R::Template, List | Detail) => Some(rule(filters, PassThrough, Company)),

        _ => None,
    }
}

fn lookup(actor: &Actor, resource: ResourceKind, op: Operation) -> Result<PolicyRule, AuthzError> {
    policy_rule(actor.role, resource, op).ok_or_else(|| {
        AuthzError::Forbidden(format!(
            "role {} may not {:?} {:?} records",
            actor.role, op, resource
        ))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluator
// ─────────────────────────────────────────────────────────────────────────────

/// Check that the role may perform `op` on `resource` at all.
///
/// Use for operations without a concrete target yet (create, list).
pub fn ensure_granted(actor: &Actor, resource: ResourceKind, op: Operation) -> Result<(), AuthzError> {
    lookup(actor, resource, op).map(|_| ())
}

/// Resolve the filter predicate for a list query.
pub fn resolve_list(
    actor: &Actor,
    resource: ResourceKind,
    requested: &ListFilters,
) -> Result<ResolvedFilter, AuthzError> {
    let policy = lookup(actor, resource, Operation::List)?;

    let scope = match policy.scope {
        ScopeRule::Company => Scope::Company,
        ScopeRule::OwnRecord => Scope::Only(actor.id),
        ScopeRule::OwnOrReports => Scope::SelfOrReports(actor.id),
        ScopeRule::ReviewerIsActor | ScopeRule::ReviewerOfReport => Scope::ReviewedBy(actor.id),
        ScopeRule::ReportsOnly => {
            return Err(AuthzError::Forbidden("list requires a visible scope".to_string()));
        }
    };

    let mut conditions = Vec::new();
    if policy.mode != FilterMode::Ignore {
        for field in policy.filters {
            let Some(values) = requested.get(*field) else {
                continue;
            };

            if *field == FilterField::Department && policy.mode == FilterMode::OwnDepartmentOnly {
                let own = actor.department.as_deref();
                if values.iter().any(|v| Some(v.as_str()) != own) {
                    return Err(AuthzError::InvalidFilter("invalid department".to_string()));
                }
            }

            let condition = if field.is_text() {
                // Multiple free-text values: the first wins, like a single query parameter.
                FilterCondition::Contains(values[0].to_lowercase())
            } else {
                FilterCondition::AnyOf(values.to_vec())
            };
            conditions.push((*field, condition));
        }
    }

    Ok(ResolvedFilter {
        company_id: actor.company_id,
        scope,
        conditions,
    })
}

/// Check a concrete target record for `op`.
pub fn authorize_target(
    actor: &Actor,
    resource: ResourceKind,
    op: Operation,
    target: &impl PolicySubject,
) -> Result<(), AuthzError> {
    let policy = lookup(actor, resource, op)?;

    if target.company_id() != actor.company_id {
        return Err(AuthzError::OutsideCompany);
    }

    let is_subject = target.subject_id() == actor.id;
    let manages_subject = target.line_manager_id() == Some(actor.id);
    let reviews = target.reviewer_id() == Some(actor.id);

    let allowed = match policy.scope {
        ScopeRule::Company => true,
        ScopeRule::OwnRecord => is_subject,
        ScopeRule::OwnOrReports => is_subject || manages_subject,
        ScopeRule::ReportsOnly => manages_subject,
        ScopeRule::ReviewerIsActor => reviews,
        ScopeRule::ReviewerOfReport => manages_subject && reviews,
    };

    if allowed {
        Ok(())
    } else {
        let reason = match policy.scope {
            ScopeRule::ReportsOnly | ScopeRule::ReviewerOfReport => {
                "only the employee's line manager can access this record"
            }
            _ => "invalid role for this record",
        };
        Err(AuthzError::Forbidden(reason.to_string()))
    }
}
