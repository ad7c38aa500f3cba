use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, SqlErr,
};

use crate::{
    entity,
    error::{RepositoryError, RepositoryResult},
    models::{CreateUser, User, UserChanges},
    repository::UserRepository,
};

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn select(active_only: bool) -> Select<entity::Entity> {
        let query = entity::Entity::find();
        if active_only {
            query.filter(entity::Column::Active.eq(true))
        } else {
            query
        }
    }
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        let sql = err.sql_err();
        classify(err, sql)
    }
}

/// `sql` is the driver-level reading of `err` (only Postgres errors carry one)
fn classify(err: DbErr, sql: Option<SqlErr>) -> RepositoryError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = sql {
        return RepositoryError::UniqueViolation(detail);
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepositoryError::RecordNotFound,
        DbErr::Type(detail) | DbErr::Json(detail) => RepositoryError::Unexpected(detail),
        other => RepositoryError::Database(other.to_string()),
    }
}

fn optional<T: Into<sea_orm::Value>>(value: Option<T>) -> sea_orm::ActiveValue<T> {
    match value {
        Some(v) => Set(v),
        None => NotSet,
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: CreateUser) -> RepositoryResult<User> {
        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        Ok(model.into())
    }

    async fn find_page(
        &self,
        skip: u64,
        take: u64,
        active_only: bool,
    ) -> RepositoryResult<(Vec<User>, u64)> {
        let models = Self::select(active_only)
            .order_by_asc(entity::Column::Id)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await?;
        let total = Self::select(active_only).count(&self.db).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn find_by_id(&self, id: i32, active_only: bool) -> RepositoryResult<Option<User>> {
        let model = Self::select(active_only)
            .filter(entity::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(&self, id: i32, changes: UserChanges) -> RepositoryResult<User> {
        // Nothing to write; still report a missing row
        if changes.is_empty() {
            return self
                .find_by_id(id, false)
                .await?
                .ok_or(RepositoryError::RecordNotFound);
        }

        let active_model = entity::ActiveModel {
            id: Set(id),
            first_name: optional(changes.first_name),
            last_name: optional(changes.last_name),
            email: optional(changes.email),
            active: NotSet,
        };

        // UPDATE ... RETURNING yields RecordNotUpdated when no row matched
        let model = active_model.update(&self.db).await?;
        Ok(model.into())
    }

    async fn soft_delete(&self, id: i32) -> RepositoryResult<User> {
        let active_model = entity::ActiveModel {
            id: Set(id),
            active: Set(false),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await?;
        tracing::debug!(user_id = id, "Marked user inactive");
        Ok(model.into())
    }

    async fn count(&self, active_only: bool) -> RepositoryResult<u64> {
        Ok(Self::select(active_only).count(&self.db).await?)
    }
}
