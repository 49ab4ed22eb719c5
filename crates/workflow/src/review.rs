//! Performance reviews attached to paperwork.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use hrspace_auth::{FilterField, PolicySubject, Role};
use hrspace_core::{
    CompanyId, DateRange, DomainError, DomainResult, EmployeeId, Entity, PaperworkId, RecordState,
    ReviewId,
};
use hrspace_directory::Employee;

use crate::Paperwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReviewDecision {
    #[default]
    Pending,
    Pass,
    Extend,
    Renew,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Pending => "Pending",
            ReviewDecision::Pass => "Pass",
            ReviewDecision::Extend => "Extend",
            ReviewDecision::Renew => "Renew",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtendTime {
    #[serde(rename = "1 month")]
    OneMonth,
    #[serde(rename = "2 months")]
    TwoMonths,
}

/// Rating on a 1..=9 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "score must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub title: String,
    pub reviewer_id: Option<EmployeeId>,
    pub reviewee_id: EmployeeId,
    pub review_date: NaiveDate,
    pub paperwork_id: PaperworkId,
    pub attitude: Option<Score>,
    pub work_quality: Option<Score>,
    pub decision: ReviewDecision,
    pub extend_time: Option<ExtendTime>,
    pub improvement: Option<String>,
    pub state: RecordState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub title: String,
    pub reviewer_id: Option<EmployeeId>,
    pub reviewee_id: EmployeeId,
    pub review_date: NaiveDate,
    pub paperwork_id: PaperworkId,
    pub attitude: Option<Score>,
    pub work_quality: Option<Score>,
    #[serde(default)]
    pub decision: ReviewDecision,
    pub extend_time: Option<ExtendTime>,
    pub improvement: Option<String>,
}

/// Replacement of the assessment fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    /// Kept when absent.
    pub title: Option<String>,
    /// Kept when absent.
    pub review_date: Option<NaiveDate>,
    pub attitude: Option<Score>,
    pub work_quality: Option<Score>,
    #[serde(default)]
    pub decision: ReviewDecision,
    pub extend_time: Option<ExtendTime>,
    pub improvement: Option<String>,
}

/// Review date must fall inside the paperwork period, bounds included.
pub fn ensure_date_within(date: NaiveDate, period: &DateRange) -> DomainResult<()> {
    if date < period.start() {
        return Err(DomainError::validation(
            "review date must not precede the paperwork start date",
        ));
    }
    if date > period.last() {
        return Err(DomainError::validation(
            "review date must not follow the paperwork last date",
        ));
    }
    Ok(())
}

/// `extend_time` only means something for an `Extend` decision.
fn extend_time_for(decision: ReviewDecision, extend_time: Option<ExtendTime>) -> Option<ExtendTime> {
    match decision {
        ReviewDecision::Extend => extend_time,
        _ => None,
    }
}

impl Review {
    /// Pending review synthesized with a new paperwork.
    pub fn generated_for(id: ReviewId, paperwork: &Paperwork, employee: &Employee) -> Self {
        Self {
            id,
            title: paperwork.review_title(&employee.name),
            reviewer_id: employee.line_manager_id,
            reviewee_id: employee.id,
            review_date: paperwork.period.last(),
            paperwork_id: paperwork.id,
            attitude: None,
            work_quality: None,
            decision: ReviewDecision::Pending,
            extend_time: None,
            improvement: None,
            state: RecordState::Active,
        }
    }

    pub fn create(id: ReviewId, input: NewReview, paperwork: &Paperwork) -> DomainResult<Self> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("review title cannot be empty"));
        }
        if input.paperwork_id != paperwork.id || input.reviewee_id != paperwork.employee_id {
            return Err(DomainError::validation("review does not match the paperwork's employee"));
        }
        ensure_date_within(input.review_date, &paperwork.period)?;

        Ok(Self {
            id,
            title: title.to_string(),
            reviewer_id: input.reviewer_id,
            reviewee_id: input.reviewee_id,
            review_date: input.review_date,
            paperwork_id: input.paperwork_id,
            attitude: input.attitude,
            work_quality: input.work_quality,
            decision: input.decision,
            extend_time: extend_time_for(input.decision, input.extend_time),
            improvement: input.improvement,
            state: RecordState::Active,
        })
    }

    pub fn is_same_assignment(
        &self,
        reviewer: Option<EmployeeId>,
        reviewee: EmployeeId,
        paperwork: PaperworkId,
    ) -> bool {
        self.reviewer_id == reviewer && self.reviewee_id == reviewee && self.paperwork_id == paperwork
    }

    /// Managers cannot touch a review once it has passed.
    pub fn ensure_mutable_by(&self, role: Role) -> DomainResult<()> {
        if role == Role::Manager && self.decision == ReviewDecision::Pass {
            return Err(DomainError::state(
                "review result was submitted, contact an admin for adjustments",
            ));
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: ReviewUpdate, period: &DateRange) -> DomainResult<()> {
        let title = match update.title.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::validation("review title cannot be empty")),
            Some(t) => t.to_string(),
            None => self.title.clone(),
        };
        let review_date = update.review_date.unwrap_or(self.review_date);
        ensure_date_within(review_date, period)?;

        self.title = title;
        self.review_date = review_date;
        self.attitude = update.attitude;
        self.work_quality = update.work_quality;
        self.decision = update.decision;
        self.extend_time = extend_time_for(update.decision, update.extend_time);
        self.improvement = update.improvement;
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.state = RecordState::Deleted;
    }
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}

/// Review seen together with its reviewee, for policy checks.
#[derive(Debug, Clone, Copy)]
pub struct ReviewAccess<'a> {
    pub review: &'a Review,
    pub reviewee: &'a Employee,
}

impl PolicySubject for ReviewAccess<'_> {
    fn company_id(&self) -> CompanyId {
        self.reviewee.company_id
    }

    fn subject_id(&self) -> EmployeeId {
        self.review.reviewee_id
    }

    fn line_manager_id(&self) -> Option<EmployeeId> {
        self.reviewee.line_manager_id
    }

    fn reviewer_id(&self) -> Option<EmployeeId> {
        self.review.reviewer_id
    }

    fn filter_value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::Decision => Some(self.review.decision.as_str().to_string()),
            FilterField::Title => Some(self.review.title.clone()),
            _ => None,
        }
    }
}
