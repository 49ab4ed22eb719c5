//! Invariants binding an employee profile to its login credential.
//!
//! The two records share one id and must agree on company, email and role.

use hrspace_auth::Role;
use hrspace_core::{DomainError, DomainResult, EmployeeId};

use crate::{Employee, User};

/// Check that a profile and credential form a consistent pair.
pub fn ensure_paired(employee: &Employee, user: &User) -> DomainResult<()> {
    if employee.id != user.id {
        return Err(DomainError::internal("credential id does not match employee id"));
    }
    if employee.company_id != user.company_id {
        return Err(DomainError::internal(format!(
            "employee {} and credential disagree on company",
            employee.id
        )));
    }
    if employee.role != user.role {
        return Err(DomainError::internal(format!(
            "employee {} and credential disagree on role",
            employee.id
        )));
    }
    Ok(())
}

/// Whether the credential counts as a finished login.
///
/// A credential issued at hire time stays pending until the account is
/// confirmed or an admin activates the employee.
pub fn login_completed(employee: &Employee, user: &User) -> bool {
    user.activated || employee.user_generated
}

/// Change the role on both records.
///
/// A company founder cannot change their own role. Without a credential only
/// the profile changes.
pub fn change_role(
    employee: &mut Employee,
    user: Option<&mut User>,
    acting: EmployeeId,
    role: Role,
) -> DomainResult<()> {
    if employee.role == role {
        return Ok(());
    }

    match user {
        Some(user) => {
            if user.is_founder() && acting == employee.id {
                return Err(DomainError::conflict("founding admin cannot change their own role"));
            }
            employee.role = role;
            user.role = role;
        }
        None => employee.role = role,
    }
    Ok(())
}
