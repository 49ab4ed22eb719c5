//! Policy-scoped reads over employees and credentials.

use tracing::debug;

use hrspace_auth::{
    Actor, ListFilters, Operation, ResourceKind, authorize_target, resolve_list,
};
use hrspace_core::{DomainError, DomainResult, EmployeeId, Entity, Page, PageRequest};
use hrspace_directory::{Employee, User};

use crate::context::HrContext;
use crate::store::Collection;

pub struct QueryService {
    ctx: HrContext,
}

impl QueryService {
    pub fn new(ctx: HrContext) -> Self {
        Self { ctx }
    }

    /// Employees visible to the actor, most recent first.
    pub fn list_employees(
        &self,
        actor: &Actor,
        filters: &ListFilters,
        page: PageRequest,
    ) -> DomainResult<Page<Employee>> {
        let filter = resolve_list(actor, ResourceKind::Employee, filters)?;
        let visible: Vec<_> = self
            .ctx
            .store
            .employees
            .list()?
            .into_iter()
            .filter(|e| e.is_active() && filter.matches(e))
            .collect();

        debug!(actor = %actor.id, matched = visible.len(), "employees listed");
        Ok(page.paginate(visible))
    }

    pub fn employee_detail(&self, actor: &Actor, employee_id: EmployeeId) -> DomainResult<Employee> {
        let employee = self.ctx.store.employee_in(actor.company_id, employee_id)?;
        authorize_target(actor, ResourceKind::Employee, Operation::Detail, &employee)?;
        Ok(employee)
    }

    pub fn list_users(
        &self,
        actor: &Actor,
        filters: &ListFilters,
        page: PageRequest,
    ) -> DomainResult<Page<User>> {
        let filter = resolve_list(actor, ResourceKind::User, filters)?;
        let visible: Vec<_> = self
            .ctx
            .store
            .users
            .list()?
            .into_iter()
            .filter(|u| u.is_active() && filter.matches(u))
            .collect();
        Ok(page.paginate(visible))
    }

    pub fn user_detail(&self, actor: &Actor, employee_id: EmployeeId) -> DomainResult<User> {
        let Some(user) = self.ctx.store.active_user(employee_id)? else {
            return Err(DomainError::not_found("user does not exist"));
        };
        authorize_target(actor, ResourceKind::User, Operation::Detail, &user)?;
        Ok(user)
    }
}
