//! Soft-delete cascade.
//!
//! Deleted records stay in the store (state `Deleted`) for audit. Every write
//! goes through the caller's compensation log so a failed cascade leaves
//! nothing half-deleted.

use tracing::debug;

use hrspace_core::{CompanyId, DomainError, DomainResult, EmployeeId, Entity, ReviewId};
use hrspace_workflow::Paperwork;

use crate::saga::Compensations;
use crate::store::{Collection, HrStore};

/// Soft-delete a paperwork and every active review attached to it.
///
/// A review referenced by `paperwork.review_id` must exist. Returns the ids of
/// the retired reviews.
pub fn retire_paperwork<'a>(
    tx: &mut Compensations<'a>,
    store: &'a HrStore,
    mut paperwork: Paperwork,
) -> DomainResult<Vec<ReviewId>> {
    if let Some(linked) = paperwork.review_id {
        store.review(linked)?;
    }

    let attached: Vec<_> = store
        .reviews
        .list()?
        .into_iter()
        .filter(|r| r.is_active() && r.paperwork_id == paperwork.id)
        .collect();

    let mut retired = Vec::with_capacity(attached.len());
    for mut review in attached {
        review.mark_deleted();
        retired.push(review.id);
        tx.put(&store.reviews, review.id, review)?;
    }

    debug!(paperwork = %paperwork.id, reviews = retired.len(), "paperwork retired");
    let id = paperwork.id;
    paperwork.mark_deleted();
    tx.put(&store.paperworks, id, paperwork)?;
    Ok(retired)
}

/// Remove an employee from the company and soft-delete everything they own:
/// paperwork, reviews, the HR profile, and the paired credential.
pub fn retire_employee<'a>(
    tx: &mut Compensations<'a>,
    store: &'a HrStore,
    company_id: CompanyId,
    employee_id: EmployeeId,
) -> DomainResult<()> {
    let mut company = store.company(company_id)?;
    company.withdraw(employee_id)?;
    tx.put(&store.companies, company_id, company)?;

    let mut employee = store.employee_in(company_id, employee_id)?;

    for paperwork in store.paperworks_of(employee_id)? {
        retire_paperwork(tx, store, paperwork)?;
    }

    employee.mark_deleted();
    tx.put(&store.employees, employee_id, employee)?;

    match store.active_user(employee_id)? {
        Some(mut user) => {
            user.revoke();
            tx.put(&store.users, employee_id, user)?;
        }
        None => debug!(employee = %employee_id, "no active credential to revoke"),
    }

    Ok(())
}

/// Reviews can also be deleted without their paperwork.
pub fn retire_review<'a>(
    tx: &mut Compensations<'a>,
    store: &'a HrStore,
    review_id: ReviewId,
) -> DomainResult<()> {
    let mut review = store.review(review_id)?;
    let linked = store
        .paperworks
        .list()?
        .into_iter()
        .find(|p| p.is_active() && p.review_id == Some(review_id));
    let Some(mut paperwork) = linked else {
        return Err(DomainError::not_found("no paperwork related to this review"));
    };

    paperwork.unlink_review(review_id)?;
    tx.put(&store.paperworks, paperwork.id, paperwork)?;

    review.mark_deleted();
    tx.put(&store.reviews, review_id, review)?;
    Ok(())
}
