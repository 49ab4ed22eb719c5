//! Paperwork and review coordination.
//!
//! A paperwork belongs to one employee and may carry one linked review. The
//! employee keeps both id lists (most recent first); the paperwork keeps the
//! review back-reference. Every mutation keeps the three in step inside one
//! compensated unit.

use tracing::{debug, info, instrument};

use hrspace_auth::{
    Actor, ListFilters, Operation, ResourceKind, authorize_target, ensure_granted, resolve_list,
};
use hrspace_core::{
    CompanyId, DomainError, DomainResult, EmployeeId, Page, PageRequest, PaperworkId, ReviewId,
    TemplateId,
};
use hrspace_directory::Employee;
use hrspace_workflow::{
    NewPaperwork, NewReview, Paperwork, PaperworkAccess, PaperworkUpdate, Review, ReviewAccess,
    ReviewUpdate, review::ensure_date_within,
};

use crate::cascade::{retire_paperwork, retire_review};
use crate::context::HrContext;
use crate::notify::{Notice, dispatch};
use crate::saga::Compensations;
use crate::store::{HrStore, fetch_active};

pub struct WorkflowService {
    ctx: HrContext,
}

impl WorkflowService {
    pub fn new(ctx: HrContext) -> Self {
        Self { ctx }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Paperwork
    // ─────────────────────────────────────────────────────────────────────

    /// Create a paperwork; with `review_generated` a pending review for the
    /// line manager is created and linked in the same unit.
    #[instrument(skip(self, actor, input), fields(actor = %actor.id, employee = %employee_id))]
    pub fn create_paperwork(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        input: NewPaperwork,
    ) -> DomainResult<Paperwork> {
        ensure_granted(actor, ResourceKind::Paperwork, Operation::Create)?;
        let store = &*self.ctx.store;
        let mut owner = store.employee_in(actor.company_id, employee_id)?;
        if let Some(template_id) = input.template_id {
            ensure_template(store, actor.company_id, template_id)?;
        }

        let mut paperwork = Paperwork::draft(PaperworkId::new(), employee_id, input)?;
        Paperwork::ensure_unique_window(
            &store.paperworks_of(employee_id)?,
            &paperwork.period,
            paperwork.kind,
            None,
        )?;

        let review = paperwork
            .review_generated
            .then(|| Review::generated_for(ReviewId::new(), &paperwork, &owner));

        let paperwork = Compensations::run("create_paperwork", |tx| {
            if let Some(review) = review {
                paperwork.link_review(review.id);
                owner.attach_review(review.id);
                tx.insert(&store.reviews, review.id, review)?;
            }
            tx.insert(&store.paperworks, paperwork.id, paperwork.clone())?;
            owner.attach_paperwork(paperwork.id);
            tx.put(&store.employees, owner.id, owner)?;
            Ok(paperwork)
        })?;

        info!(paperwork = %paperwork.id, review = ?paperwork.review_id, "paperwork created");
        Ok(paperwork)
    }

    pub fn list_paperwork(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        filters: &ListFilters,
        page: PageRequest,
    ) -> DomainResult<Page<Paperwork>> {
        let owner = self.ctx.store.employee_in(actor.company_id, employee_id)?;
        authorize_target(actor, ResourceKind::Paperwork, Operation::List, &owner)?;
        let filter = resolve_list(actor, ResourceKind::Paperwork, filters)?;

        let visible: Vec<_> = self
            .ctx
            .store
            .paperworks_of(employee_id)?
            .into_iter()
            .filter(|p| {
                filter.matches(&PaperworkAccess {
                    paperwork: p,
                    owner: &owner,
                })
            })
            .collect();
        Ok(page.paginate(visible))
    }

    pub fn get_paperwork(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        paperwork_id: PaperworkId,
    ) -> DomainResult<Paperwork> {
        let (owner, paperwork) = self.owned_paperwork(actor.company_id, employee_id, paperwork_id)?;
        authorize_target(
            actor,
            ResourceKind::Paperwork,
            Operation::Detail,
            &PaperworkAccess {
                paperwork: &paperwork,
                owner: &owner,
            },
        )?;
        Ok(paperwork)
    }

    #[instrument(skip(self, actor, update), fields(actor = %actor.id, paperwork = %paperwork_id))]
    pub fn update_paperwork(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        paperwork_id: PaperworkId,
        update: PaperworkUpdate,
    ) -> DomainResult<Paperwork> {
        ensure_granted(actor, ResourceKind::Paperwork, Operation::Update)?;
        let store = &*self.ctx.store;
        let (owner, mut paperwork) = self.owned_paperwork(actor.company_id, employee_id, paperwork_id)?;
        authorize_target(
            actor,
            ResourceKind::Paperwork,
            Operation::Update,
            &PaperworkAccess {
                paperwork: &paperwork,
                owner: &owner,
            },
        )?;
        if let Some(template_id) = update.template_id {
            ensure_template(store, actor.company_id, template_id)?;
        }

        paperwork.apply_update(update)?;
        Paperwork::ensure_unique_window(
            &store.paperworks_of(employee_id)?,
            &paperwork.period,
            paperwork.kind,
            Some(paperwork_id),
        )?;
        // Reviews already attached must stay inside the new period.
        for review in store
            .reviews_of(employee_id)?
            .iter()
            .filter(|r| r.paperwork_id == paperwork_id)
        {
            ensure_date_within(review.review_date, &paperwork.period)?;
        }

        Compensations::run("update_paperwork", |tx| {
            tx.put(&store.paperworks, paperwork_id, paperwork.clone())?;
            Ok(())
        })?;

        info!(status = ?paperwork.status, "paperwork updated");
        Ok(paperwork)
    }

    /// Soft-delete a paperwork with its reviews and drop both back-references.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub fn delete_paperwork(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        paperwork_id: PaperworkId,
    ) -> DomainResult<()> {
        ensure_granted(actor, ResourceKind::Paperwork, Operation::Delete)?;
        let store = &*self.ctx.store;
        let (mut owner, paperwork) = self.owned_paperwork(actor.company_id, employee_id, paperwork_id)?;

        Compensations::run("delete_paperwork", |tx| {
            let retired = retire_paperwork(tx, store, paperwork)?;
            owner.detach_paperwork(paperwork_id)?;
            for review_id in retired {
                if owner.review_ids.contains(&review_id) {
                    owner.detach_review(review_id)?;
                }
            }
            tx.put(&store.employees, owner.id, owner)?;
            Ok(())
        })?;

        info!(paperwork = %paperwork_id, "paperwork deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reviews
    // ─────────────────────────────────────────────────────────────────────

    #[instrument(skip(self, actor, input), fields(actor = %actor.id, employee = %employee_id))]
    pub fn create_review(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        input: NewReview,
    ) -> DomainResult<Review> {
        ensure_granted(actor, ResourceKind::Review, Operation::Create)?;
        let store = &*self.ctx.store;
        let (mut owner, paperwork) =
            self.owned_paperwork(actor.company_id, employee_id, input.paperwork_id)?;
        if input.reviewee_id != owner.id {
            return Err(DomainError::validation("reviewee must be the paperwork's employee"));
        }
        if let Some(reviewer_id) = input.reviewer_id {
            store.employee_in(actor.company_id, reviewer_id)?;
        }

        let duplicate = store.reviews_of(owner.id)?.iter().any(|r| {
            r.is_same_assignment(input.reviewer_id, input.reviewee_id, input.paperwork_id)
        });
        if duplicate {
            return Err(DomainError::conflict("review already exists for this assignment"));
        }

        let review = Review::create(ReviewId::new(), input, &paperwork)?;

        let review = Compensations::run("create_review", |tx| {
            tx.insert(&store.reviews, review.id, review.clone())?;

            owner.attach_review(review.id);
            if owner.line_manager_id.is_none() {
                owner.line_manager_id = review.reviewer_id;
            }
            tx.put(&store.employees, owner.id, owner)?;

            let mut paperwork = store.paperwork(review.paperwork_id)?;
            paperwork.link_review(review.id);
            tx.put(&store.paperworks, paperwork.id, paperwork)?;
            Ok(review)
        })?;

        info!(review = %review.id, paperwork = %review.paperwork_id, "review created");
        Ok(review)
    }

    pub fn list_reviews(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        filters: &ListFilters,
        page: PageRequest,
    ) -> DomainResult<Page<Review>> {
        let owner = self.ctx.store.employee_in(actor.company_id, employee_id)?;
        let filter = resolve_list(actor, ResourceKind::Review, filters)?;

        let visible: Vec<_> = self
            .ctx
            .store
            .reviews_of(employee_id)?
            .into_iter()
            .filter(|r| {
                filter.matches(&ReviewAccess {
                    review: r,
                    reviewee: &owner,
                })
            })
            .collect();
        debug!(actor = %actor.id, matched = visible.len(), "reviews listed");
        Ok(page.paginate(visible))
    }

    pub fn get_review(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        review_id: ReviewId,
    ) -> DomainResult<Review> {
        let (owner, review) = self.owned_review(actor.company_id, employee_id, review_id)?;
        authorize_target(
            actor,
            ResourceKind::Review,
            Operation::Detail,
            &ReviewAccess {
                review: &review,
                reviewee: &owner,
            },
        )?;
        Ok(review)
    }

    #[instrument(skip(self, actor, update), fields(actor = %actor.id, review = %review_id))]
    pub fn update_review(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        review_id: ReviewId,
        update: ReviewUpdate,
    ) -> DomainResult<Review> {
        ensure_granted(actor, ResourceKind::Review, Operation::Update)?;
        let store = &*self.ctx.store;
        let (owner, mut review) = self.owned_review(actor.company_id, employee_id, review_id)?;
        authorize_target(
            actor,
            ResourceKind::Review,
            Operation::Update,
            &ReviewAccess {
                review: &review,
                reviewee: &owner,
            },
        )?;
        review.ensure_mutable_by(actor.role)?;

        let paperwork = store.paperwork(review.paperwork_id)?;
        review.apply_update(update, &paperwork.period)?;

        Compensations::run("update_review", |tx| {
            tx.put(&store.reviews, review_id, review.clone())?;
            Ok(())
        })?;

        info!(decision = review.decision.as_str(), "review updated");
        Ok(review)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub fn delete_review(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        review_id: ReviewId,
    ) -> DomainResult<()> {
        ensure_granted(actor, ResourceKind::Review, Operation::Delete)?;
        let store = &*self.ctx.store;
        let (mut owner, _) = self.owned_review(actor.company_id, employee_id, review_id)?;

        Compensations::run("delete_review", |tx| {
            owner.detach_review(review_id)?;
            tx.put(&store.employees, owner.id, owner)?;
            retire_review(tx, store, review_id)
        })?;

        info!(review = %review_id, "review deleted");
        Ok(())
    }

    /// Remind the reviewer about a review. Only the employee's current line
    /// manager may send it, and only while they are the review's reviewer.
    /// `path` is appended to the frontend base URL to form the link.
    #[instrument(skip(self, actor, path), fields(actor = %actor.id, review = %review_id))]
    pub fn share_review(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        review_id: ReviewId,
        path: &str,
    ) -> DomainResult<()> {
        let store = &*self.ctx.store;
        let (owner, review) = self.owned_review(actor.company_id, employee_id, review_id)?;
        authorize_target(
            actor,
            ResourceKind::Review,
            Operation::Share,
            &ReviewAccess {
                review: &review,
                reviewee: &owner,
            },
        )?;

        let Some(reviewer_id) = review.reviewer_id else {
            return Err(DomainError::validation("review has no reviewer"));
        };
        if owner.line_manager_id != Some(reviewer_id) {
            return Err(DomainError::validation(
                "only the employee's current line manager can be reminded",
            ));
        }
        let reviewer: Employee = fetch_active(&store.employees, &reviewer_id, "reviewer")?;
        if !reviewer.user_generated {
            return Err(DomainError::state("reviewer has no activated account"));
        }

        let link = format!("{}{}", self.ctx.config.mail.frontend_base_url, path);
        dispatch(
            self.ctx.notifier.as_ref(),
            Notice::ReviewReminder {
                reviewer_name: reviewer.name,
                reviewee_name: owner.name,
                email: reviewer.email,
                link,
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────

    /// Employee plus one of their paperworks; the paperwork must be on the
    /// employee's list.
    fn owned_paperwork(
        &self,
        company_id: CompanyId,
        employee_id: EmployeeId,
        paperwork_id: PaperworkId,
    ) -> DomainResult<(Employee, Paperwork)> {
        let owner = self.ctx.store.employee_in(company_id, employee_id)?;
        if !owner.has_paperwork(paperwork_id) {
            return Err(DomainError::not_found("paperwork is not on the employee's list"));
        }
        let paperwork = self.ctx.store.paperwork(paperwork_id)?;
        if paperwork.employee_id != employee_id {
            return Err(DomainError::not_found("paperwork does not belong to this employee"));
        }
        Ok((owner, paperwork))
    }

    fn owned_review(
        &self,
        company_id: CompanyId,
        employee_id: EmployeeId,
        review_id: ReviewId,
    ) -> DomainResult<(Employee, Review)> {
        let owner = self.ctx.store.employee_in(company_id, employee_id)?;
        let review = self.ctx.store.review(review_id)?;
        if review.reviewee_id != employee_id {
            return Err(DomainError::not_found("review does not belong to this employee"));
        }
        Ok((owner, review))
    }
}

fn ensure_template(store: &HrStore, company_id: CompanyId, id: TemplateId) -> DomainResult<()> {
    let template = store.template(id)?;
    if template.company_id != company_id {
        return Err(DomainError::not_found("template does not exist"));
    }
    Ok(())
}
