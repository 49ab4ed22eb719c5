//! Lifecycle synchronizer: keeps each `Employee` profile and its `User`
//! credential in step through registration, creation, activation, password
//! changes, revocation and deletion.
//!
//! Every multi-document write runs in one [`Compensations`] unit. Notices are
//! dispatched only after the unit commits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use hrspace_auth::{
    Actor, Operation, ResourceKind, authorize_target, ensure_granted, generate_password,
};
use hrspace_core::{CompanyId, DomainError, DomainResult, Email, EmployeeId, Entity};
use hrspace_directory::{
    Company, Employee, EmployeeUpdate, NewEmployee, User, change_role, ensure_paired, login_completed,
    parse_batch,
};

use crate::cascade::retire_employee;
use crate::context::HrContext;
use crate::notify::{Notice, dispatch};
use crate::saga::Compensations;
use crate::session::{SignedIn, issue_access_token};
use crate::store::{HrStore, fetch_active, find_active};

/// Self-service sign-up of a new company and its founding admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompany {
    pub company_name: String,
    pub name: String,
    pub email: Email,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub company: Company,
    pub employee: Employee,
    pub user: User,
}

pub struct LifecycleService {
    ctx: HrContext,
}

impl LifecycleService {
    pub fn new(ctx: HrContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, input), fields(company = %input.company_name))]
    pub fn register_company(&self, input: RegisterCompany) -> DomainResult<Registration> {
        let store = &*self.ctx.store;
        if input.password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        if store.company_named(&input.company_name)?.is_some() {
            return Err(DomainError::conflict("company name is already taken"));
        }
        if store.user_by_email(&input.email)?.is_some() {
            return Err(DomainError::conflict("an account with this email already exists"));
        }
        if store.employee_by_email(&input.email, None)?.is_some() {
            return Err(DomainError::conflict(
                "this email belongs to an employee; contact your company HR to activate your account",
            ));
        }

        let id = EmployeeId::new();
        let company_id = CompanyId::new();
        let hash = self.ctx.hasher.hash(&input.password)?;
        let code = self.ctx.tokens.sign_confirmation(input.email.as_str())?;

        let mut employee = Employee::founder(id, company_id, &input.name, input.email.clone())?;
        employee.password_hash = Some(hash.clone());
        let mut company = Company::register(company_id, &input.company_name, id)?;
        company.enroll(id);
        let user = User::derive_from(&employee, hash, code.clone(), None);

        let registration = Compensations::run("register_company", |tx| {
            tx.insert(&store.users, id, user.clone())?;
            tx.insert(&store.companies, company_id, company.clone())?;
            tx.insert(&store.employees, id, employee.clone())?;
            Ok(Registration {
                company,
                employee,
                user,
            })
        })?;

        info!(company = %company_id, founder = %id, "company registered");
        dispatch(
            self.ctx.notifier.as_ref(),
            Notice::VerifyOnly {
                name: registration.employee.name.clone(),
                email: registration.employee.email.clone(),
                confirmation_code: code,
            },
        );
        Ok(registration)
    }

    #[instrument(skip(self, actor, draft), fields(actor = %actor.id))]
    pub fn create_employee(&self, actor: &Actor, draft: NewEmployee) -> DomainResult<Employee> {
        ensure_granted(actor, ResourceKind::Employee, Operation::Create)?;
        let store = &*self.ctx.store;
        let admin = store.employee_in(actor.company_id, actor.id)?;
        self.ensure_email_free(actor.company_id, &draft.email)?;

        let (employee, notice) = Compensations::run("create_employee", |tx| {
            self.hire_one(tx, store, actor, &admin, draft)
        })?;

        info!(employee = %employee.id, company = %employee.company_id, "employee created");
        dispatch(self.ctx.notifier.as_ref(), notice);
        Ok(employee)
    }

    /// Bulk create from field maps. The whole batch is validated first and
    /// written as one unit.
    #[instrument(skip(self, actor, rows), fields(actor = %actor.id, rows = rows.len()))]
    pub fn import_employees(&self, actor: &Actor, rows: &[Value]) -> DomainResult<Vec<Employee>> {
        ensure_granted(actor, ResourceKind::Employee, Operation::Create)?;
        let store = &*self.ctx.store;
        let admin = store.employee_in(actor.company_id, actor.id)?;

        let mut drafts = parse_batch(rows)?;
        for draft in &mut drafts {
            self.ensure_email_free(actor.company_id, &draft.email)?;
            if draft.line_manager_id.is_none() {
                draft.line_manager_id = Some(actor.id);
            }
        }

        let created = Compensations::run("import_employees", |tx| {
            drafts
                .into_iter()
                .map(|draft| self.hire_one(tx, store, actor, &admin, draft))
                .collect::<DomainResult<Vec<_>>>()
        })?;

        info!(count = created.len(), company = %actor.company_id, "employees imported");
        let mut employees = Vec::with_capacity(created.len());
        for (employee, notice) in created {
            dispatch(self.ctx.notifier.as_ref(), notice);
            employees.push(employee);
        }
        Ok(employees)
    }

    /// Give an existing employee a login. A pending credential left by
    /// hiring is replaced; a completed one is a conflict.
    #[instrument(skip(self, actor, password), fields(actor = %actor.id))]
    pub fn activate_user(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        password: Option<String>,
    ) -> DomainResult<User> {
        ensure_granted(actor, ResourceKind::User, Operation::Create)?;
        let store = &*self.ctx.store;
        let admin = store.employee_in(actor.company_id, actor.id)?;
        let mut employee: Employee = fetch_active(&store.employees, &employee_id, "employee")?;
        if let Some(existing) = store.active_user(employee_id)? {
            if login_completed(&employee, &existing) {
                return Err(DomainError::conflict("user already exists for this employee"));
            }
            debug!(employee = %employee_id, "replacing pending credential");
        }

        let password = password.filter(|p| !p.is_empty()).unwrap_or_else(generate_password);
        let hash = self.ctx.hasher.hash(&password)?;
        let code = self.ctx.tokens.sign_confirmation(employee.email.as_str())?;

        let user = Compensations::run("activate_user", |tx| {
            move_to_company(tx, store, &mut employee, actor.company_id)?;
            employee.password_hash = Some(hash.clone());
            employee.user_generated = true;
            let user = User::derive_from(&employee, hash, code.clone(), Some(actor.id));
            tx.put(&store.employees, employee.id, employee.clone())?;
            tx.put(&store.users, user.id, user.clone())?;
            Ok(user)
        })?;

        info!(user = %user.id, "login activated");
        dispatch(
            self.ctx.notifier.as_ref(),
            Notice::PasswordAndVerify {
                name: user.name.clone(),
                email: user.email.clone(),
                password,
                confirmation_code: code,
                sender: admin.name,
            },
        );
        Ok(user)
    }

    /// Consume a confirmation code and sign the user in.
    #[instrument(skip_all)]
    pub fn verify_account(&self, code: &str) -> DomainResult<SignedIn> {
        let store = &*self.ctx.store;
        let claims = self.ctx.tokens.decode_confirmation(code)?;
        let email = Email::parse(&claims.email)?;

        let mut user = store
            .user_by_email(&email)?
            .filter(|u| !u.activated && u.confirmation_code.as_deref() == Some(code))
            .ok_or_else(|| DomainError::not_found("no pending account for this confirmation code"))?;
        let mut employee = store.employee_in(user.company_id, user.id)?;

        user.activate(code)?;
        employee.user_generated = true;
        ensure_paired(&employee, &user)?;

        Compensations::run("verify_account", |tx| {
            tx.put(&store.users, user.id, user.clone())?;
            tx.put(&store.employees, employee.id, employee)?;
            Ok(())
        })?;

        info!(user = %user.id, "account verified");
        let access_token = issue_access_token(&self.ctx, &user, chrono::Utc::now())?;
        Ok(SignedIn { user, access_token })
    }

    /// Replace the profile; role, name, email and password are mirrored onto
    /// the credential.
    #[instrument(skip(self, actor, update), fields(actor = %actor.id))]
    pub fn update_employee(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        update: EmployeeUpdate,
    ) -> DomainResult<Employee> {
        ensure_granted(actor, ResourceKind::Employee, Operation::Update)?;
        let store = &*self.ctx.store;
        let admin = store.employee_in(actor.company_id, actor.id)?;
        let mut employee = store.employee_in(actor.company_id, employee_id)?;
        authorize_target(actor, ResourceKind::Employee, Operation::Update, &employee)?;

        if let Some(email) = update.email.as_ref().filter(|e| **e != employee.email) {
            self.ensure_email_free(actor.company_id, email)?;
            if store.user_by_email(email)?.is_some_and(|u| u.id != employee_id) {
                return Err(DomainError::conflict("an account with this email already exists"));
            }
        }

        employee.apply_profile(&update)?;
        let mut user = store.active_user(employee_id)?;
        if let Some(role) = update.role {
            change_role(&mut employee, user.as_mut(), actor.id, role)?;
        }
        if let Some(user) = user.as_mut() {
            user.name = employee.name.clone();
            user.email = employee.email.clone();
        }

        let mut notice = None;
        if let Some(password) = update.password.as_deref().filter(|p| !p.is_empty()) {
            notice = self.change_password(&mut employee, &mut user, password, actor, &admin)?;
        }
        if let Some(user) = &user {
            ensure_paired(&employee, user)?;
        }

        Compensations::run("update_employee", |tx| {
            tx.put(&store.employees, employee.id, employee.clone())?;
            if let Some(user) = user {
                tx.put(&store.users, user.id, user)?;
            }
            Ok(())
        })?;

        info!(employee = %employee.id, "employee updated");
        if let Some(notice) = notice {
            dispatch(self.ctx.notifier.as_ref(), notice);
        }
        Ok(employee)
    }

    /// Admin sets a new password for an employee that already has a login.
    #[instrument(skip(self, actor, password), fields(actor = %actor.id))]
    pub fn reset_password(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        password: Option<String>,
    ) -> DomainResult<User> {
        ensure_granted(actor, ResourceKind::User, Operation::Update)?;
        let store = &*self.ctx.store;
        let mut employee: Employee = fetch_active(&store.employees, &employee_id, "employee")?;
        let Some(mut user) = store.active_user(employee_id)? else {
            return Err(DomainError::not_found("user does not exist"));
        };

        let password = password.filter(|p| !p.is_empty()).unwrap_or_else(generate_password);
        let hash = self.ctx.hasher.hash(&password)?;

        let user = Compensations::run("reset_password", |tx| {
            move_to_company(tx, store, &mut employee, actor.company_id)?;
            user.company_id = employee.company_id;
            employee.password_hash = Some(hash.clone());
            user.password_hash = Some(hash);
            tx.put(&store.employees, employee.id, employee.clone())?;
            tx.put(&store.users, user.id, user.clone())?;
            Ok(user)
        })?;

        info!(user = %user.id, "password reset by admin");
        dispatch(
            self.ctx.notifier.as_ref(),
            Notice::PasswordOnly {
                name: user.name.clone(),
                email: user.email.clone(),
                password,
            },
        );
        Ok(user)
    }

    /// Forgotten password: mail a fresh one to the account owner.
    #[instrument(skip(self))]
    pub fn reset_password_via_email(&self, email: &str) -> DomainResult<()> {
        let store = &*self.ctx.store;
        let email = Email::parse(email)?;
        let Some(mut user) = store.user_by_email(&email)? else {
            return Err(DomainError::not_found("user does not exist"));
        };
        let Some(mut employee) = store.employee_by_email(&email, Some(user.company_id))? else {
            return Err(DomainError::not_found("employee does not exist"));
        };

        let password = generate_password();
        let hash = self.ctx.hasher.hash(&password)?;
        employee.password_hash = Some(hash.clone());
        user.password_hash = Some(hash);

        let notice = if user.activated && employee.user_generated {
            Notice::PasswordOnly {
                name: user.name.clone(),
                email: user.email.clone(),
                password,
            }
        } else {
            let code = self.ctx.tokens.sign_confirmation(user.email.as_str())?;
            user.confirmation_code = Some(code.clone());
            Notice::PasswordAndVerify {
                name: user.name.clone(),
                email: user.email.clone(),
                password,
                confirmation_code: code,
                sender: self.ctx.config.mail.sender.clone(),
            }
        };

        Compensations::run("reset_password_via_email", |tx| {
            tx.put(&store.employees, employee.id, employee)?;
            tx.put(&store.users, user.id, user)?;
            Ok(())
        })?;

        info!(email = %email, "password reset requested");
        dispatch(self.ctx.notifier.as_ref(), notice);
        Ok(())
    }

    /// Remove the login but keep the HR profile.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub fn revoke_login(&self, actor: &Actor, employee_id: EmployeeId) -> DomainResult<()> {
        ensure_granted(actor, ResourceKind::User, Operation::Delete)?;
        if employee_id == actor.id {
            return Err(DomainError::permission("cannot revoke your own login"));
        }
        let store = &*self.ctx.store;
        let mut employee = store.employee_in(actor.company_id, employee_id)?;
        let Some(mut user) = store.active_user(employee_id)? else {
            return Err(DomainError::not_found("user does not exist"));
        };
        authorize_target(actor, ResourceKind::User, Operation::Delete, &user)?;

        employee.user_generated = false;
        user.revoke();

        Compensations::run("revoke_login", |tx| {
            tx.put(&store.employees, employee.id, employee)?;
            tx.put(&store.users, user.id, user)?;
            Ok(())
        })?;

        info!(employee = %employee_id, "login revoked");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub fn delete_employee(&self, actor: &Actor, employee_id: EmployeeId) -> DomainResult<()> {
        ensure_granted(actor, ResourceKind::Employee, Operation::Delete)?;
        let store = &*self.ctx.store;
        let target = store.employee_in(actor.company_id, employee_id)?;
        authorize_target(actor, ResourceKind::Employee, Operation::Delete, &target)?;

        Compensations::run("delete_employee", |tx| {
            retire_employee(tx, store, actor.company_id, employee_id)
        })?;

        info!(employee = %employee_id, "employee deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn ensure_email_free(&self, company_id: CompanyId, email: &Email) -> DomainResult<()> {
        if self.ctx.store.employee_by_email(email, Some(company_id))?.is_some() {
            return Err(DomainError::conflict(format!(
                "employee with email {email} already exists"
            )));
        }
        Ok(())
    }

    /// Create one employee, enroll it, and derive its pending credential.
    /// The credential only becomes a login once confirmed or activated.
    fn hire_one<'a>(
        &self,
        tx: &mut Compensations<'a>,
        store: &'a HrStore,
        actor: &Actor,
        admin: &Employee,
        mut draft: NewEmployee,
    ) -> DomainResult<(Employee, Notice)> {
        let password = draft
            .password
            .take()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(generate_password);

        let mut employee = Employee::hire(EmployeeId::new(), actor.company_id, draft)?;
        let hash = self.ctx.hasher.hash(&password)?;
        employee.password_hash = Some(hash.clone());
        tx.insert(&store.employees, employee.id, employee.clone())?;

        let mut company = store.company(actor.company_id)?;
        company.enroll(employee.id);
        tx.put(&store.companies, actor.company_id, company)?;

        let code = self.ctx.tokens.sign_confirmation(employee.email.as_str())?;
        let user = User::derive_from(&employee, hash, code.clone(), Some(actor.id));
        tx.put(&store.users, user.id, user)?;

        let notice = if employee.user_generated {
            Notice::PasswordOnly {
                name: employee.name.clone(),
                email: employee.email.clone(),
                password,
            }
        } else {
            Notice::PasswordAndVerify {
                name: employee.name.clone(),
                email: employee.email.clone(),
                password,
                confirmation_code: code,
                sender: admin.name.clone(),
            }
        };
        Ok((employee, notice))
    }

    /// Store a changed password on both records. An unchanged password is a
    /// no-op; a first password issues the credential.
    fn change_password(
        &self,
        employee: &mut Employee,
        user: &mut Option<User>,
        password: &str,
        actor: &Actor,
        admin: &Employee,
    ) -> DomainResult<Option<Notice>> {
        let name = employee.name.clone();
        let email = employee.email.clone();

        if let Some(current) = employee.password_hash.as_deref() {
            if self.ctx.hasher.verify(password, current) {
                return Ok(None);
            }
            let hash = self.ctx.hasher.hash(password)?;
            employee.password_hash = Some(hash.clone());
            if let Some(user) = user.as_mut() {
                user.password_hash = Some(hash);
            }
            return Ok(Some(Notice::PasswordOnly {
                name,
                email,
                password: password.to_string(),
            }));
        }

        let hash = self.ctx.hasher.hash(password)?;
        employee.password_hash = Some(hash.clone());
        if employee.user_generated {
            if let Some(user) = user.as_mut() {
                user.password_hash = Some(hash);
            }
            return Ok(Some(Notice::PasswordOnly {
                name,
                email,
                password: password.to_string(),
            }));
        }

        let code = self.ctx.tokens.sign_confirmation(email.as_str())?;
        match user.as_mut() {
            Some(user) => {
                user.password_hash = Some(hash);
                user.confirmation_code = Some(code.clone());
            }
            None => {
                *user = Some(User::derive_from(employee, hash, code.clone(), Some(actor.id)));
            }
        }
        Ok(Some(Notice::PasswordAndVerify {
            name,
            email,
            password: password.to_string(),
            confirmation_code: code,
            sender: admin.name.clone(),
        }))
    }
}

/// Move an employee onto `target`'s roster when it belongs elsewhere.
fn move_to_company<'a>(
    tx: &mut Compensations<'a>,
    store: &'a HrStore,
    employee: &mut Employee,
    target: CompanyId,
) -> DomainResult<()> {
    if employee.company_id == target {
        return Ok(());
    }

    let previous: Option<Company> = find_active(&store.companies, &employee.company_id)?;
    if let Some(mut previous) = previous.filter(|c| c.has_member(employee.id)) {
        previous.withdraw(employee.id)?;
        tx.put(&store.companies, *previous.id(), previous)?;
    }

    let mut company = store.company(target)?;
    company.enroll(employee.id);
    tx.put(&store.companies, target, company)?;

    info!(employee = %employee.id, from = %employee.company_id, to = %target, "employee moved");
    employee.company_id = target;
    Ok(())
}
