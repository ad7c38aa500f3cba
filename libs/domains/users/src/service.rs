use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::fault;
use crate::models::{CreateUser, Page, PageMetadata, Pagination, UpdateUser, User};
use crate::repository::UserRepository;

/// Service layer for User business logic.
///
/// Reads only see active users. Update and remove target any id, so a
/// soft-deleted user can still be edited or deleted again.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

// Manual impl: derive would demand `R: Clone`
impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new active user
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input.validate()?;

        let email = input.email.clone();
        self.repository.create(input).await.map_err(|e| {
            let message = format!("Email '{}' is already in use.", email);
            fault::translate(e, Some(&message))
        })
    }

    /// One page of active users ordered by id
    #[instrument(skip(self))]
    pub async fn find_all(&self, pagination: Pagination) -> UserResult<Page<User>> {
        pagination.validate()?;

        let (page, limit) = (pagination.page(), pagination.limit());
        let skip = pagination
            .offset()
            .ok_or_else(|| UserError::Validation("page is out of range".to_string()))?;

        let (data, total_rows) = self
            .repository
            .find_page(skip, limit as u64, true)
            .await?;

        Ok(Page {
            data,
            metadata: PageMetadata::new(page, limit, total_rows),
        })
    }

    /// Fetch an active user
    #[instrument(skip(self), fields(user_id = id))]
    pub async fn find_one(&self, id: i32) -> UserResult<User> {
        self.repository
            .find_by_id(id, true)
            .await?
            .ok_or_else(UserError::not_found)
    }

    /// Overwrite the fields present in `input`. The id inside `input` is
    /// ignored; `id` alone selects the row.
    #[instrument(skip(self, input), fields(user_id = id))]
    pub async fn update_user(&self, id: i32, input: UpdateUser) -> UserResult<User> {
        input.validate()?;

        Ok(self.repository.update(id, input.into_changes()).await?)
    }

    /// Soft delete: the row is kept with `active = false`
    #[instrument(skip(self), fields(user_id = id))]
    pub async fn remove_user(&self, id: i32) -> UserResult<User> {
        let user = self.repository.soft_delete(id).await?;

        tracing::info!(user_id = user.id, "User deactivated");
        Ok(user)
    }
}
