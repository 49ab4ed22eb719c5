use serde::{Deserialize, Serialize};

use hrspace_core::{CompanyId, DomainError, DomainResult, EmployeeId, Entity, RecordState};

/// A registered company and its employee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    id: CompanyId,
    name: String,
    registered_by: EmployeeId,
    /// Most recently enrolled first.
    employee_ids: Vec<EmployeeId>,
    state: RecordState,
}

impl Company {
    pub fn register(id: CompanyId, name: &str, registered_by: EmployeeId) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            registered_by,
            employee_ids: Vec::new(),
            state: RecordState::Active,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The founding admin.
    pub fn registered_by(&self) -> EmployeeId {
        self.registered_by
    }

    pub fn employee_ids(&self) -> &[EmployeeId] {
        &self.employee_ids
    }

    pub fn has_member(&self, id: EmployeeId) -> bool {
        self.employee_ids.contains(&id)
    }

    /// Put an employee at the head of the roster. Re-enrolling moves them to the front.
    pub fn enroll(&mut self, id: EmployeeId) {
        self.employee_ids.retain(|e| *e != id);
        self.employee_ids.insert(0, id);
    }

    pub fn withdraw(&mut self, id: EmployeeId) -> DomainResult<()> {
        let Some(pos) = self.employee_ids.iter().position(|e| *e == id) else {
            return Err(DomainError::not_found("employee does not exist in company"));
        };
        self.employee_ids.remove(pos);
        Ok(())
    }

    /// Case-insensitive name comparison used for uniqueness.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}
