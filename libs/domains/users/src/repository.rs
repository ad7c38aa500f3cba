use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{CreateUser, User, UserChanges};

/// Storage port for users.
///
/// Implementations report storage-native failures as [`RepositoryError`] and
/// leave status codes to the fault translator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new active user
    async fn create(&self, input: CreateUser) -> RepositoryResult<User>;

    /// One page ordered by id, plus the count of all matching rows
    async fn find_page(
        &self,
        skip: u64,
        take: u64,
        active_only: bool,
    ) -> RepositoryResult<(Vec<User>, u64)>;

    async fn find_by_id(&self, id: i32, active_only: bool) -> RepositoryResult<Option<User>>;

    /// Overwrite the given fields, `RecordNotFound` if `id` does not exist
    async fn update(&self, id: i32, changes: UserChanges) -> RepositoryResult<User>;

    /// Set `active = false`, `RecordNotFound` if `id` does not exist
    async fn soft_delete(&self, id: i32) -> RepositoryResult<User>;

    async fn count(&self, active_only: bool) -> RepositoryResult<u64>;
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<i32, User>,
    last_id: i32,
}

impl Store {
    /// Mirrors the unique index on `email`, inactive rows included
    fn ensure_email_free(&self, email: &str, except: Option<i32>) -> RepositoryResult<()> {
        let taken = self
            .users
            .values()
            .any(|u| u.email == email && Some(u.id) != except);

        if taken {
            return Err(RepositoryError::UniqueViolation(format!(
                "duplicate key value violates unique constraint \"users_email_key\" (email)=({})",
                email
            )));
        }
        Ok(())
    }
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: CreateUser) -> RepositoryResult<User> {
        let mut store = self.store.write().await;
        store.ensure_email_free(&input.email, None)?;

        store.last_id = store
            .last_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Database("users_id_seq exhausted".to_string()))?;

        let user = User {
            id: store.last_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            active: true,
        };
        store.users.insert(user.id, user.clone());

        tracing::debug!(user_id = user.id, "Stored user");
        Ok(user)
    }

    async fn find_page(
        &self,
        skip: u64,
        take: u64,
        active_only: bool,
    ) -> RepositoryResult<(Vec<User>, u64)> {
        let store = self.store.read().await;
        let matching = store.users.values().filter(|u| !active_only || u.active);

        let total = matching.clone().count() as u64;
        let page = matching
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn find_by_id(&self, id: i32, active_only: bool) -> RepositoryResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .get(&id)
            .filter(|u| !active_only || u.active)
            .cloned())
    }

    async fn update(&self, id: i32, changes: UserChanges) -> RepositoryResult<User> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&id) {
            return Err(RepositoryError::RecordNotFound);
        }
        if let Some(email) = changes.email.as_deref() {
            store.ensure_email_free(email, Some(id))?;
        }

        let user = store
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::RecordNotFound)?;
        changes.apply_to(user);
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: i32) -> RepositoryResult<User> {
        let mut store = self.store.write().await;
        let user = store
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::RecordNotFound)?;
        user.active = false;
        Ok(user.clone())
    }

    async fn count(&self, active_only: bool) -> RepositoryResult<u64> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .filter(|u| !active_only || u.active)
            .count() as u64)
    }
}
