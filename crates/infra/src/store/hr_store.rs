use hrspace_core::{
    CompanyId, DomainError, DomainResult, Email, EmployeeId, Entity, PaperworkId, ReviewId,
    TemplateId,
};
use hrspace_directory::{Company, Employee, User};
use hrspace_workflow::{Paperwork, Review, Template};

use super::{Collection, InMemoryCollection};

/// Fetch a document that must exist and be active.
pub fn fetch_active<K, V, C>(collection: &C, key: &K, what: &str) -> DomainResult<V>
where
    C: Collection<K, V> + ?Sized,
    V: Entity,
{
    match collection.get(key)? {
        Some(doc) if doc.is_active() => Ok(doc),
        _ => Err(DomainError::not_found(format!("{what} does not exist"))),
    }
}

/// Fetch a document if it exists and is active.
pub fn find_active<K, V, C>(collection: &C, key: &K) -> DomainResult<Option<V>>
where
    C: Collection<K, V> + ?Sized,
    V: Entity,
{
    Ok(collection.get(key)?.filter(Entity::is_active))
}

/// All collections of the HR document store.
#[derive(Debug)]
pub struct HrStore {
    pub companies: InMemoryCollection<CompanyId, Company>,
    pub employees: InMemoryCollection<EmployeeId, Employee>,
    /// Keyed by the paired employee id.
    pub users: InMemoryCollection<EmployeeId, User>,
    pub paperworks: InMemoryCollection<PaperworkId, Paperwork>,
    pub reviews: InMemoryCollection<ReviewId, Review>,
    pub templates: InMemoryCollection<TemplateId, Template>,
}

impl Default for HrStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HrStore {
    pub fn new() -> Self {
        Self {
            companies: InMemoryCollection::new("companies"),
            employees: InMemoryCollection::new("employees"),
            users: InMemoryCollection::new("users"),
            paperworks: InMemoryCollection::new("paperworks"),
            reviews: InMemoryCollection::new("reviews"),
            templates: InMemoryCollection::new("templates"),
        }
    }

    pub fn company(&self, id: CompanyId) -> DomainResult<Company> {
        fetch_active(&self.companies, &id, "company")
    }

    /// Active employee of the given company. Other companies' employees read as missing.
    pub fn employee_in(&self, company_id: CompanyId, id: EmployeeId) -> DomainResult<Employee> {
        let employee: Employee = fetch_active(&self.employees, &id, "employee")?;
        if employee.company_id != company_id {
            return Err(DomainError::not_found("employee does not exist"));
        }
        Ok(employee)
    }

    pub fn active_user(&self, id: EmployeeId) -> DomainResult<Option<User>> {
        find_active(&self.users, &id)
    }

    pub fn paperwork(&self, id: PaperworkId) -> DomainResult<Paperwork> {
        fetch_active(&self.paperworks, &id, "paperwork")
    }

    pub fn review(&self, id: ReviewId) -> DomainResult<Review> {
        fetch_active(&self.reviews, &id, "review")
    }

    pub fn template(&self, id: TemplateId) -> DomainResult<Template> {
        fetch_active(&self.templates, &id, "template")
    }

    pub fn company_named(&self, name: &str) -> DomainResult<Option<Company>> {
        Ok(self
            .companies
            .list()?
            .into_iter()
            .find(|c| c.is_active() && c.has_name(name)))
    }

    /// Active employee with this email, optionally within one company.
    pub fn employee_by_email(
        &self,
        email: &Email,
        company_id: Option<CompanyId>,
    ) -> DomainResult<Option<Employee>> {
        Ok(self.employees.list()?.into_iter().find(|e| {
            e.is_active() && e.email == *email && company_id.is_none_or(|c| e.company_id == c)
        }))
    }

    pub fn user_by_email(&self, email: &Email) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .list()?
            .into_iter()
            .find(|u| u.is_active() && u.email == *email))
    }

    /// Active paperwork of an employee, most recent first.
    pub fn paperworks_of(&self, employee_id: EmployeeId) -> DomainResult<Vec<Paperwork>> {
        Ok(self
            .paperworks
            .list()?
            .into_iter()
            .filter(|p| p.is_active() && p.employee_id == employee_id)
            .collect())
    }

    /// Active reviews about an employee, most recent first.
    pub fn reviews_of(&self, reviewee_id: EmployeeId) -> DomainResult<Vec<Review>> {
        Ok(self
            .reviews
            .list()?
            .into_iter()
            .filter(|r| r.is_active() && r.reviewee_id == reviewee_id)
            .collect())
    }
}
