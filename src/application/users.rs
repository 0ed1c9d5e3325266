use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("User not found")]
    NotFound,
    #[error("user is referenced by {count} todos")]
    InUse { count: u64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// User management. Users referenced by any todo cannot be deleted, so user
/// mutations never touch cached todo payloads.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, UserError> {
        self.repo.list_users().await.map_err(UserError::from)
    }

    pub async fn create_user(&self, name: Option<&str>) -> Result<UserRecord, UserError> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(UserError::InvalidInput("Name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(UserError::InvalidInput(
                "Name must be at most 255 characters",
            ));
        }

        let user = self.repo.create_user(name).await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32) -> Result<(), UserError> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(UserError::NotFound);
        }

        let count = self.repo.count_references(id).await?;
        if count > 0 {
            return Err(UserError::InUse { count });
        }

        match self.repo.delete_user(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(UserError::NotFound),
            Err(RepoError::Integrity { .. }) => return Err(UserError::InUse { count: 1 }),
            Err(err) => return Err(err.into()),
        }

        info!(user_id = id, "user deleted");
        Ok(())
    }
}
