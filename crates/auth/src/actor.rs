use serde::{Deserialize, Serialize};

use hrspace_core::{CompanyId, EmployeeId};

use crate::Role;

/// The authenticated identity performing a request.
///
/// Role and department come from the actor's current employee profile, not
/// from the token, so a role change takes effect on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: EmployeeId,
    pub company_id: CompanyId,
    pub role: Role,
    pub department: Option<String>,
}

impl Actor {
    pub fn new(id: EmployeeId, company_id: CompanyId, role: Role) -> Self {
        Self {
            id,
            company_id,
            role,
            department: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
