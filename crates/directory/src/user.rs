//! Login credential paired with an employee profile.

use serde::{Deserialize, Serialize};

use hrspace_auth::{FilterField, PolicySubject, Role};
use hrspace_core::{CompanyId, DomainError, DomainResult, Email, EmployeeId, Entity, RecordState};

use crate::Employee;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Same value as the paired `Employee::id`.
    pub id: EmployeeId,
    pub name: String,
    pub email: Email,
    /// Cleared when the login is revoked.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub company_id: CompanyId,
    pub role: Role,
    /// Admin who created the credential; `None` for a company founder.
    pub generated_by: Option<EmployeeId>,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub confirmation_code: Option<String>,
    pub state: RecordState,
}

impl User {
    /// Derive a pending credential from an employee profile.
    pub fn derive_from(
        employee: &Employee,
        password_hash: String,
        confirmation_code: String,
        generated_by: Option<EmployeeId>,
    ) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            password_hash: Some(password_hash),
            company_id: employee.company_id,
            role: employee.role,
            generated_by,
            activated: false,
            confirmation_code: Some(confirmation_code),
            state: RecordState::Active,
        }
    }

    pub fn is_founder(&self) -> bool {
        self.generated_by.is_none()
    }

    /// Consume a confirmation code.
    pub fn activate(&mut self, code: &str) -> DomainResult<()> {
        if self.activated {
            return Err(DomainError::state("account is already activated"));
        }
        if self.confirmation_code.as_deref() != Some(code) {
            return Err(DomainError::not_found("no pending account for this confirmation code"));
        }
        self.activated = true;
        Ok(())
    }

    /// Whether this credential may log in.
    pub fn can_login(&self) -> bool {
        self.activated && self.state.is_active() && self.password_hash.is_some()
    }

    /// Disable the credential and mark it deleted. The HR profile is untouched.
    pub fn revoke(&mut self) {
        self.activated = false;
        self.password_hash = None;
        self.confirmation_code = None;
        self.state = RecordState::Deleted;
    }
}

impl Entity for User {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}

impl PolicySubject for User {
    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn subject_id(&self) -> EmployeeId {
        self.id
    }

    fn line_manager_id(&self) -> Option<EmployeeId> {
        None
    }

    fn filter_value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::Name => Some(self.name.clone()),
            FilterField::Activated => Some(self.activated.to_string()),
            _ => None,
        }
    }
}
