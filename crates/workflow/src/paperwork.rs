//! Employment paperwork (contracts) and their status machine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use hrspace_auth::{FilterField, PolicySubject};
use hrspace_core::{
    CompanyId, DateRange, DomainError, DomainResult, EmployeeId, Entity, PaperworkId, RecordState,
    ReviewId, TemplateId,
};
use hrspace_directory::{Employee, EmploymentType};

/// Paperwork types follow the employment types.
pub type PaperworkType = EmploymentType;

/// `Pending -> Generated -> Signed`, forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum PaperworkStatus {
    #[default]
    Pending,
    Generated,
    Signed,
}

impl PaperworkStatus {
    /// Move to `next`. Re-setting the current status is a no-op; moving back fails.
    pub fn advance_to(self, next: PaperworkStatus) -> DomainResult<PaperworkStatus> {
        if next < self {
            return Err(DomainError::state(format!(
                "paperwork status cannot move from {self:?} back to {next:?}"
            )));
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paperwork {
    pub id: PaperworkId,
    pub title: String,
    pub period: DateRange,
    #[serde(rename = "type")]
    pub kind: PaperworkType,
    pub status: PaperworkStatus,
    pub employee_id: EmployeeId,
    pub review_id: Option<ReviewId>,
    pub template_id: Option<TemplateId>,
    pub content: Option<String>,
    pub review_generated: bool,
    pub state: RecordState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaperwork {
    pub title: String,
    pub start_date: NaiveDate,
    pub last_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: PaperworkType,
    #[serde(default)]
    pub status: PaperworkStatus,
    pub template_id: Option<TemplateId>,
    pub content: Option<String>,
    /// Synthesize a pending review along with the paperwork.
    #[serde(default = "default_review_generated")]
    pub review_generated: bool,
}

fn default_review_generated() -> bool {
    true
}

/// Replacement of the editable paperwork fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperworkUpdate {
    pub title: String,
    pub start_date: NaiveDate,
    pub last_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: PaperworkType,
    pub status: PaperworkStatus,
    pub template_id: Option<TemplateId>,
    pub content: Option<String>,
}

fn required_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("paperwork title cannot be empty"));
    }
    Ok(title.to_string())
}

impl Paperwork {
    pub fn draft(id: PaperworkId, employee_id: EmployeeId, input: NewPaperwork) -> DomainResult<Self> {
        Ok(Self {
            id,
            title: required_title(&input.title)?,
            period: DateRange::new(input.start_date, input.last_date)?,
            kind: input.kind,
            status: input.status,
            employee_id,
            review_id: None,
            template_id: input.template_id,
            content: input.content,
            review_generated: input.review_generated,
            state: RecordState::Active,
        })
    }

    pub fn same_window(&self, period: &DateRange, kind: PaperworkType) -> bool {
        self.period == *period && self.kind == kind
    }

    /// Reject a window already used by another active paperwork of the employee.
    pub fn ensure_unique_window<'a>(
        existing: impl IntoIterator<Item = &'a Paperwork>,
        period: &DateRange,
        kind: PaperworkType,
        except: Option<PaperworkId>,
    ) -> DomainResult<()> {
        let clash = existing.into_iter().any(|p| {
            p.state.is_active() && Some(p.id) != except && p.same_window(period, kind)
        });
        if clash {
            return Err(DomainError::conflict("paperwork already exists for this period and type"));
        }
        Ok(())
    }

    /// Title of the review synthesized for this paperwork.
    pub fn review_title(&self, employee_name: &str) -> String {
        format!("Review for {employee_name}'s {}", self.title)
    }

    pub fn apply_update(&mut self, update: PaperworkUpdate) -> DomainResult<()> {
        let title = required_title(&update.title)?;
        let period = DateRange::new(update.start_date, update.last_date)?;
        let status = self.status.advance_to(update.status)?;

        self.title = title;
        self.period = period;
        self.kind = update.kind;
        self.status = status;
        self.template_id = update.template_id;
        self.content = update.content;
        Ok(())
    }

    pub fn link_review(&mut self, id: ReviewId) {
        self.review_id = Some(id);
    }

    pub fn unlink_review(&mut self, id: ReviewId) -> DomainResult<()> {
        if self.review_id != Some(id) {
            return Err(DomainError::not_found("no paperwork related to this review"));
        }
        self.review_id = None;
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.state = RecordState::Deleted;
    }
}

impl Entity for Paperwork {
    type Id = PaperworkId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}

/// Paperwork seen together with its owner, for policy checks.
#[derive(Debug, Clone, Copy)]
pub struct PaperworkAccess<'a> {
    pub paperwork: &'a Paperwork,
    pub owner: &'a Employee,
}

impl PolicySubject for PaperworkAccess<'_> {
    fn company_id(&self) -> CompanyId {
        self.owner.company_id
    }

    fn subject_id(&self) -> EmployeeId {
        self.paperwork.employee_id
    }

    fn line_manager_id(&self) -> Option<EmployeeId> {
        self.owner.line_manager_id
    }

    fn filter_value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::Title => Some(self.paperwork.title.clone()),
            _ => None,
        }
    }
}
