//! Employee HR profile.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use hrspace_auth::{Actor, FilterField, PolicySubject, Role};
use hrspace_core::{
    CompanyId, DomainError, DomainResult, Email, EmployeeId, Entity, PaperworkId, RecordState,
    ReviewId,
};

/// Implements `as_str`, `Display` and `FromStr` for a closed set of labels.
macro_rules! impl_labels {
    ($t:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $t {
            pub const ALL: &'static [$t] = &[$($t::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($t::$variant => $label),+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($t::$variant),)+
                    other => Err(DomainError::validation(format!("invalid {} '{}'", $what, other))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Sales,
    Marketing,
    Engineering,
    #[serde(rename = "Human Resources")]
    HumanResources,
    Finance,
    Management,
}

impl_labels!(Department, "department", {
    Sales => "Sales",
    Marketing => "Marketing",
    Engineering => "Engineering",
    HumanResources => "Human Resources",
    Finance => "Finance",
    Management => "Management",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EmploymentStatus {
    #[default]
    Active,
    Resigned,
}

impl_labels!(EmploymentStatus, "employment status", {
    Active => "Active",
    Resigned => "Resigned",
});

/// Employment type. Paperwork types and template categories use the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    Intern,
    Probation,
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
}

impl_labels!(EmploymentType, "employment type", {
    Intern => "Intern",
    Probation => "Probation",
    FullTime => "Full-time",
    PartTime => "Part-time",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl_labels!(Gender, "gender", {
    Male => "Male",
    Female => "Female",
});

/// Optional personal fields kept on the HR profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub gross_salary: Option<u64>,
    pub gender: Option<Gender>,
    pub birthday: Option<NaiveDate>,
    pub phone: Option<String>,
    pub personal_email: Option<String>,
    pub permanent_address: Option<String>,
    pub city: Option<String>,
}

/// Stored HR profile.
///
/// `id` is also the id of the paired credential once one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub company_id: CompanyId,
    pub password_hash: Option<String>,
    pub onboard_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub employment_status: EmploymentStatus,
    pub employment_type: Option<EmploymentType>,
    pub department: Option<Department>,
    pub line_manager_id: Option<EmployeeId>,
    /// Most recent first.
    pub paperwork_ids: Vec<PaperworkId>,
    /// Most recent first.
    pub review_ids: Vec<ReviewId>,
    /// Set once the employee has verified a credential.
    pub user_generated: bool,
    #[serde(flatten)]
    pub personal: PersonalDetails,
    pub state: RecordState,
}

/// Input for a new employee, from a single create or an import row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Initial plaintext password; generated when absent.
    pub password: Option<String>,
    pub onboard_date: Option<NaiveDate>,
    pub title: Option<String>,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
    pub employment_type: Option<EmploymentType>,
    pub department: Option<Department>,
    pub line_manager_id: Option<EmployeeId>,
    #[serde(default, flatten)]
    pub personal: PersonalDetails,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, email: Email, role: Role) -> Self {
        Self {
            name: name.into(),
            email,
            role,
            password: None,
            onboard_date: None,
            title: None,
            employment_status: EmploymentStatus::Active,
            employment_type: None,
            department: None,
            line_manager_id: None,
            personal: PersonalDetails::default(),
        }
    }

    pub fn with_line_manager(mut self, id: EmployeeId) -> Self {
        self.line_manager_id = Some(id);
        self
    }

    pub fn with_department(mut self, department: Department) -> Self {
        self.department = Some(department);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("employee name cannot be empty"));
        }
        if self.password.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(DomainError::validation("password cannot be blank"));
        }
        validate_title(self.title.as_deref())
    }
}

/// Longest accepted job title, in characters.
pub const MAX_TITLE_LEN: usize = 30;

fn validate_title(title: Option<&str>) -> DomainResult<()> {
    match title {
        Some(t) if t.chars().count() > MAX_TITLE_LEN => Err(DomainError::validation(format!(
            "title cannot be longer than {MAX_TITLE_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

/// Full replacement of the editable profile fields.
///
/// Fields left `None` are cleared, matching a form submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<Role>,
    pub password: Option<String>,
    pub onboard_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub employment_status: Option<EmploymentStatus>,
    pub employment_type: Option<EmploymentType>,
    pub department: Option<Department>,
    pub line_manager_id: Option<EmployeeId>,
    #[serde(default, flatten)]
    pub personal: PersonalDetails,
}

impl Employee {
    /// Build the profile for a newly created employee.
    pub fn hire(id: EmployeeId, company_id: CompanyId, draft: NewEmployee) -> DomainResult<Self> {
        draft.validate()?;
        let Some(line_manager_id) = draft.line_manager_id else {
            return Err(DomainError::validation("line manager is required"));
        };

        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            email: draft.email,
            role: draft.role,
            company_id,
            password_hash: None,
            onboard_date: draft.onboard_date,
            title: draft.title,
            employment_status: draft.employment_status,
            employment_type: draft.employment_type,
            department: draft.department,
            line_manager_id: Some(line_manager_id),
            paperwork_ids: Vec::new(),
            review_ids: Vec::new(),
            user_generated: false,
            personal: draft.personal,
            state: RecordState::Active,
        })
    }

    /// Profile of the admin who registers a company: self-managed.
    pub fn founder(id: EmployeeId, company_id: CompanyId, name: &str, email: Email) -> DomainResult<Self> {
        let draft = NewEmployee::new(name, email, Role::Admin).with_line_manager(id);
        Self::hire(id, company_id, draft)
    }

    /// Acting identity for policy checks.
    pub fn actor(&self) -> Actor {
        let actor = Actor::new(self.id, self.company_id, self.role);
        match self.department {
            Some(d) => actor.with_department(d.as_str()),
            None => actor,
        }
    }

    pub fn is_managed_by(&self, id: EmployeeId) -> bool {
        self.line_manager_id == Some(id)
    }

    pub fn attach_paperwork(&mut self, id: PaperworkId) {
        self.paperwork_ids.retain(|p| *p != id);
        self.paperwork_ids.insert(0, id);
    }

    pub fn detach_paperwork(&mut self, id: PaperworkId) -> DomainResult<()> {
        let Some(pos) = self.paperwork_ids.iter().position(|p| *p == id) else {
            return Err(DomainError::not_found("paperwork is not on the employee's list"));
        };
        self.paperwork_ids.remove(pos);
        Ok(())
    }

    pub fn has_paperwork(&self, id: PaperworkId) -> bool {
        self.paperwork_ids.contains(&id)
    }

    pub fn attach_review(&mut self, id: ReviewId) {
        self.review_ids.retain(|r| *r != id);
        self.review_ids.insert(0, id);
    }

    pub fn detach_review(&mut self, id: ReviewId) -> DomainResult<()> {
        let Some(pos) = self.review_ids.iter().position(|r| *r == id) else {
            return Err(DomainError::not_found("review is not on the employee's list"));
        };
        self.review_ids.remove(pos);
        Ok(())
    }

    /// Replace the editable profile fields. Role and password are handled by
    /// the lifecycle layer so that the paired credential stays in step.
    pub fn apply_profile(&mut self, update: &EmployeeUpdate) -> DomainResult<()> {
        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DomainError::validation("employee name cannot be empty"))?;
        let Some(email) = update.email.clone() else {
            return Err(DomainError::validation("employee email is required"));
        };
        validate_title(update.title.as_deref())?;

        self.name = name.to_string();
        self.email = email;
        self.onboard_date = update.onboard_date;
        self.title = update.title.clone();
        self.employment_status = update.employment_status.unwrap_or_default();
        self.employment_type = update.employment_type;
        self.department = update.department;
        if update.line_manager_id.is_some() {
            self.line_manager_id = update.line_manager_id;
        }
        self.personal = update.personal.clone();
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.user_generated = false;
        self.state = RecordState::Deleted;
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}

impl PolicySubject for Employee {
    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn subject_id(&self) -> EmployeeId {
        self.id
    }

    fn line_manager_id(&self) -> Option<EmployeeId> {
        self.line_manager_id
    }

    fn filter_value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::Name => Some(self.name.clone()),
            FilterField::Department => self.department.map(|d| d.as_str().to_string()),
            FilterField::EmploymentStatus => Some(self.employment_status.as_str().to_string()),
            FilterField::EmploymentType => self.employment_type.map(|t| t.as_str().to_string()),
            _ => None,
        }
    }
}
