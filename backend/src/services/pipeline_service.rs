//! Pipeline lifecycle service.
//!
//! Example consumer of the entitlement core. Every pipeline is registered as
//! a `"pipeline"` resource on creation, and every mutating operation routes
//! through the access decision engine. Gated operations (`delete`,
//! `publish` for a developer on a group pipeline) open an approval request
//! and complete only when re-attempted after a group owner approves; the
//! core never auto-replays.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::approval::{ApprovalRequest, ApprovalStatus};
use crate::models::pipeline::{Pipeline, PipelineStatus};
use crate::models::resource::{Operation, OwnerKind, Resource};
use crate::services::access_service::{AccessService, Decision};
use crate::services::approval_service::ApprovalService;
use crate::services::resource_service::ResourceService;
use crate::store::PipelineStore;

/// Resource kind tag under which pipelines are registered.
pub const PIPELINE_RESOURCE_KIND: &str = "pipeline";

/// Outcome of a gated pipeline mutation.
#[derive(Debug, Clone)]
pub enum PipelineMutation<T> {
    /// The operation was authorized and performed.
    Completed(T),
    /// The operation needs a group owner's approval; the request is pending.
    /// Re-attempt the operation once it is approved.
    AwaitingApproval(ApprovalRequest),
}

/// Fields accepted when updating a pipeline. Absent fields keep their
/// current value.
#[derive(Debug, Default, Clone)]
pub struct UpdatePipeline {
    pub name: Option<String>,
    pub description: Option<String>,
    pub configuration: Option<serde_json::Value>,
}

/// Pipeline lifecycle service
#[derive(Clone)]
pub struct PipelineService {
    store: Arc<dyn PipelineStore>,
    resources: ResourceService,
    access: AccessService,
    approvals: ApprovalService,
}

impl PipelineService {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        resources: ResourceService,
        access: AccessService,
        approvals: ApprovalService,
    ) -> Self {
        Self {
            store,
            resources,
            access,
            approvals,
        }
    }

    /// Create a pipeline and bind it to an entitlement record. With
    /// `Some(group_id)` the record is group-owned (the caller must hold
    /// `OWNER` there); with `None` it belongs to the caller.
    pub async fn create_pipeline(
        &self,
        caller_id: Uuid,
        name: &str,
        description: Option<String>,
        configuration: serde_json::Value,
        group_id: Option<Uuid>,
    ) -> Result<Pipeline> {
        if self.store.pipeline_name_exists(name, caller_id).await? {
            return Err(AppError::Conflict(format!(
                "pipeline name already exists: {name}"
            )));
        }

        let pipeline = Pipeline::new(caller_id, name, description, configuration);
        // Establish ownership first; a denied registration must leave no
        // pipeline row behind.
        self.resources
            .register(caller_id, PIPELINE_RESOURCE_KIND, pipeline.id, group_id)
            .await?;
        self.store.insert_pipeline(&pipeline).await?;
        tracing::info!(pipeline_id = %pipeline.id, name, "created pipeline");
        Ok(pipeline)
    }

    pub async fn get_pipeline(&self, pipeline_id: Uuid, caller_id: Uuid) -> Result<Pipeline> {
        let pipeline = self.pipeline(pipeline_id).await?;
        let resource = self.resource_for(pipeline_id).await?;
        self.access
            .require_allowed(caller_id, resource.id, Operation::View)
            .await?;
        Ok(pipeline)
    }

    pub async fn update_pipeline(
        &self,
        pipeline_id: Uuid,
        caller_id: Uuid,
        changes: UpdatePipeline,
    ) -> Result<Pipeline> {
        let mut pipeline = self.pipeline(pipeline_id).await?;
        let resource = self.resource_for(pipeline_id).await?;
        self.access
            .require_allowed(caller_id, resource.id, Operation::Update)
            .await?;

        if let Some(name) = changes.name {
            pipeline.name = name;
        }
        if let Some(description) = changes.description {
            pipeline.description = Some(description);
        }
        if let Some(configuration) = changes.configuration {
            pipeline.configuration = configuration;
        }
        pipeline.updated_at = Utc::now();

        self.store.update_pipeline(&pipeline).await?;
        Ok(pipeline)
    }

    /// Delete a pipeline, or open an approval request when the caller's role
    /// gates the deletion.
    pub async fn delete_pipeline(
        &self,
        pipeline_id: Uuid,
        caller_id: Uuid,
    ) -> Result<PipelineMutation<()>> {
        self.pipeline(pipeline_id).await?;
        let resource = self.resource_for(pipeline_id).await?;

        match self
            .access
            .authorize(caller_id, resource.id, Operation::Delete)
            .await?
        {
            Decision::Allowed => {
                self.remove(pipeline_id, &resource).await?;
                Ok(PipelineMutation::Completed(()))
            }
            Decision::NeedsApproval => {
                if self
                    .approved_request(resource.id, Operation::Delete, caller_id)
                    .await?
                    .is_some()
                {
                    self.remove(pipeline_id, &resource).await?;
                    return Ok(PipelineMutation::Completed(()));
                }
                let request = self
                    .pending_or_create(resource.id, Operation::Delete, caller_id)
                    .await?;
                Ok(PipelineMutation::AwaitingApproval(request))
            }
            Decision::Denied(reason) => {
                Err(reason.into_error(caller_id, &resource, Operation::Delete))
            }
        }
    }

    /// Publish a pipeline, or open an approval request when the caller's
    /// role gates the publication.
    pub async fn publish_pipeline(
        &self,
        pipeline_id: Uuid,
        caller_id: Uuid,
    ) -> Result<PipelineMutation<Pipeline>> {
        let pipeline = self.pipeline(pipeline_id).await?;
        let resource = self.resource_for(pipeline_id).await?;

        match self
            .access
            .authorize(caller_id, resource.id, Operation::Publish)
            .await?
        {
            Decision::Allowed => Ok(PipelineMutation::Completed(self.mark_published(pipeline).await?)),
            Decision::NeedsApproval => {
                if self
                    .approved_request(resource.id, Operation::Publish, caller_id)
                    .await?
                    .is_some()
                {
                    return Ok(PipelineMutation::Completed(
                        self.mark_published(pipeline).await?,
                    ));
                }
                let request = self
                    .pending_or_create(resource.id, Operation::Publish, caller_id)
                    .await?;
                Ok(PipelineMutation::AwaitingApproval(request))
            }
            Decision::Denied(reason) => {
                Err(reason.into_error(caller_id, &resource, Operation::Publish))
            }
        }
    }

    /// Pipelines whose entitlement record is owned directly by the user.
    pub async fn pipelines_of_user(&self, user_id: Uuid) -> Result<Vec<Pipeline>> {
        self.pipelines_owned_by(OwnerKind::User, user_id).await
    }

    /// Pipelines whose entitlement record is owned by the group.
    pub async fn pipelines_of_group(&self, group_id: Uuid) -> Result<Vec<Pipeline>> {
        self.pipelines_owned_by(OwnerKind::Group, group_id).await
    }

    async fn pipelines_owned_by(
        &self,
        owner_kind: OwnerKind,
        owner_id: Uuid,
    ) -> Result<Vec<Pipeline>> {
        let resources = self.resources.find_by_owner(owner_kind, owner_id).await?;
        let mut pipelines = Vec::new();
        for resource in resources
            .into_iter()
            .filter(|r| r.kind == PIPELINE_RESOURCE_KIND)
        {
            let pipeline = self
                .store
                .find_pipeline_by_id(resource.external_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("pipeline {}", resource.external_id))
                })?;
            pipelines.push(pipeline);
        }
        Ok(pipelines)
    }

    async fn pipeline(&self, pipeline_id: Uuid) -> Result<Pipeline> {
        self.store
            .find_pipeline_by_id(pipeline_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pipeline {pipeline_id}")))
    }

    async fn resource_for(&self, pipeline_id: Uuid) -> Result<Resource> {
        self.resources
            .find_by_kind(PIPELINE_RESOURCE_KIND)
            .await?
            .into_iter()
            .find(|r| r.external_id == pipeline_id)
            .ok_or_else(|| AppError::NotFound(format!("resource for pipeline {pipeline_id}")))
    }

    async fn remove(&self, pipeline_id: Uuid, resource: &Resource) -> Result<()> {
        self.store.delete_pipeline(pipeline_id).await?;
        self.resources.deregister(resource.id).await?;
        tracing::info!(pipeline_id = %pipeline_id, "deleted pipeline");
        Ok(())
    }

    async fn mark_published(&self, mut pipeline: Pipeline) -> Result<Pipeline> {
        pipeline.status = PipelineStatus::Published;
        pipeline.updated_at = Utc::now();
        self.store.update_pipeline(&pipeline).await?;
        tracing::info!(pipeline_id = %pipeline.id, "published pipeline");
        Ok(pipeline)
    }

    /// An `APPROVED` request covering this exact (resource, operation,
    /// requester), if one exists.
    async fn approved_request(
        &self,
        resource_id: Uuid,
        operation: Operation,
        requester_id: Uuid,
    ) -> Result<Option<ApprovalRequest>> {
        let requests = self.approvals.list_requested_by(requester_id).await?;
        Ok(requests.into_iter().find(|r| {
            r.resource_id == resource_id
                && r.operation == operation
                && r.status == ApprovalStatus::Approved
        }))
    }

    /// Reuse the requester's existing `PENDING` request for the triple, or
    /// open a new one.
    async fn pending_or_create(
        &self,
        resource_id: Uuid,
        operation: Operation,
        requester_id: Uuid,
    ) -> Result<ApprovalRequest> {
        let existing = self
            .approvals
            .list_requested_by(requester_id)
            .await?
            .into_iter()
            .find(|r| {
                r.resource_id == resource_id
                    && r.operation == operation
                    && r.status == ApprovalStatus::Pending
            });
        match existing {
            Some(request) => Ok(request),
            None => {
                self.approvals
                    .create_approval(resource_id, operation, requester_id)
                    .await
            }
        }
    }
}
