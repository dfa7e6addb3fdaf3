//! Pipeline model.
//!
//! Pipelines are the example domain object protected by the entitlement core;
//! each one is registered as a `"pipeline"` resource on creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pipeline_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Draft,
    Published,
}

/// Pipeline entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub configuration: serde_json::Value,
    pub owner_id: Uuid,
    pub status: PipelineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(
        owner_id: Uuid,
        name: &str,
        description: Option<String>,
        configuration: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description,
            configuration,
            owner_id,
            status: PipelineStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}
