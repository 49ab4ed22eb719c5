//! Company-scoped document templates.

use serde::{Deserialize, Serialize};

use hrspace_auth::{Actor, FilterField, PolicySubject};
use hrspace_core::{CompanyId, DomainError, DomainResult, EmployeeId, Entity, RecordState, TemplateId};
use hrspace_directory::EmploymentType;

/// Templates are categorized by the paperwork type they produce.
pub type TemplateCategory = EmploymentType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub content: String,
    pub category: TemplateCategory,
    pub creator_id: EmployeeId,
    pub company_id: CompanyId,
    /// Editors other than the creator, in edit order.
    pub updator_ids: Vec<EmployeeId>,
    pub state: RecordState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub content: String,
    pub category: TemplateCategory,
    pub creator_id: EmployeeId,
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    pub name: String,
    pub content: String,
    pub category: TemplateCategory,
    pub company_id: CompanyId,
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("template {field} cannot be empty")));
    }
    Ok(value.to_string())
}

impl Template {
    pub fn create(id: TemplateId, input: NewTemplate, actor: &Actor) -> DomainResult<Self> {
        if input.creator_id != actor.id {
            return Err(DomainError::permission("template creator must be the logged-in user"));
        }
        if input.company_id != actor.company_id {
            return Err(DomainError::permission("template company must be the user's company"));
        }

        Ok(Self {
            id,
            name: required("name", &input.name)?,
            content: required("content", &input.content)?,
            category: input.category,
            creator_id: input.creator_id,
            company_id: input.company_id,
            updator_ids: Vec::new(),
            state: RecordState::Active,
        })
    }

    pub fn apply_update(&mut self, update: TemplateUpdate, actor: &Actor) -> DomainResult<()> {
        if update.company_id != self.company_id {
            return Err(DomainError::validation("template cannot move to another company"));
        }
        let name = required("name", &update.name)?;
        let content = required("content", &update.content)?;

        if actor.id != self.creator_id {
            self.updator_ids.push(actor.id);
        }
        self.name = name;
        self.content = content;
        self.category = update.category;
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.state = RecordState::Deleted;
    }
}

impl Entity for Template {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn state(&self) -> RecordState {
        self.state
    }
}

impl PolicySubject for Template {
    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    fn subject_id(&self) -> EmployeeId {
        self.creator_id
    }

    fn line_manager_id(&self) -> Option<EmployeeId> {
        None
    }

    fn filter_value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::Name => Some(self.name.clone()),
            FilterField::Category => Some(self.category.as_str().to_string()),
            _ => None,
        }
    }
}
