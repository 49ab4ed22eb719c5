//! Company-scoped paperwork templates.

use tracing::{info, instrument};

use hrspace_auth::{
    Actor, ListFilters, Operation, ResourceKind, authorize_target, ensure_granted, resolve_list,
};
use hrspace_core::{DomainResult, Entity, Page, PageRequest, TemplateId};
use hrspace_workflow::{NewTemplate, Template, TemplateUpdate};

use crate::context::HrContext;
use crate::saga::Compensations;
use crate::store::Collection;

pub struct TemplateService {
    ctx: HrContext,
}

impl TemplateService {
    pub fn new(ctx: HrContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub fn create(&self, actor: &Actor, input: NewTemplate) -> DomainResult<Template> {
        ensure_granted(actor, ResourceKind::Template, Operation::Create)?;
        let template = Template::create(TemplateId::new(), input, actor)?;
        self.ctx.store.templates.insert(template.id, template.clone())?;
        info!(template = %template.id, "template created");
        Ok(template)
    }

    pub fn list(
        &self,
        actor: &Actor,
        filters: &ListFilters,
        page: PageRequest,
    ) -> DomainResult<Page<Template>> {
        let filter = resolve_list(actor, ResourceKind::Template, filters)?;
        let visible: Vec<_> = self
            .ctx
            .store
            .templates
            .list()?
            .into_iter()
            .filter(|t| t.is_active() && filter.matches(t))
            .collect();
        Ok(page.paginate(visible))
    }

    pub fn get(&self, actor: &Actor, id: TemplateId) -> DomainResult<Template> {
        let template = self.ctx.store.template(id)?;
        authorize_target(actor, ResourceKind::Template, Operation::Detail, &template)?;
        Ok(template)
    }

    #[instrument(skip(self, actor, update), fields(actor = %actor.id, template = %id))]
    pub fn update(&self, actor: &Actor, id: TemplateId, update: TemplateUpdate) -> DomainResult<Template> {
        ensure_granted(actor, ResourceKind::Template, Operation::Update)?;
        let mut template = self.ctx.store.template(id)?;
        authorize_target(actor, ResourceKind::Template, Operation::Update, &template)?;

        template.apply_update(update, actor)?;
        self.ctx.store.templates.put(id, template.clone())?;
        info!(updators = template.updator_ids.len(), "template updated");
        Ok(template)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id, template = %id))]
    pub fn delete(&self, actor: &Actor, id: TemplateId) -> DomainResult<()> {
        ensure_granted(actor, ResourceKind::Template, Operation::Delete)?;
        let store = &*self.ctx.store;
        let mut template = store.template(id)?;
        authorize_target(actor, ResourceKind::Template, Operation::Delete, &template)?;

        template.mark_deleted();
        Compensations::run("delete_template", |tx| {
            tx.put(&store.templates, id, template)?;
            Ok(())
        })?;
        info!("template deleted");
        Ok(())
    }
}
