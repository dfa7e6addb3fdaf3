//! Business logic services.

pub mod access_service;
pub mod approval_service;
pub mod group_service;
pub mod pipeline_service;
pub mod resource_service;
pub mod user_service;
