//! User administration service.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::store::EntitlementStore;

/// Fields accepted when updating a user. Absent fields keep their current
/// value.
#[derive(Debug, Default, Clone)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// User administration service
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn EntitlementStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Create a user. The credential hash, if any, arrives pre-hashed from
    /// the identity layer.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<User> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let user = User::new(username, password_hash, email, phone);
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, username, "created user");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, changes: UpdateUser) -> Result<User> {
        let mut user = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = Some(password_hash);
        }
        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_user(id).await? {
            return Err(AppError::NotFound(format!("user {id}")));
        }
        tracing::info!(user_id = %id, "deleted user");
        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.store.find_user_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.store.find_user_by_username(username).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }
}
