//! Message-pattern handlers.
//!
//! Each pattern binds its payload to a request type, validates it, and calls
//! one [`UserService`] operation. No business logic lives here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::fault::INTERNAL_ERROR_MESSAGE;
use crate::models::{CreateUser, Pagination, UpdateUser, UserId};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const CREATE_USER: &str = "create_user";
pub const FIND_ALL_USERS: &str = "find_all_users";
pub const FIND_ONE_USER: &str = "find_one_user";
pub const UPDATE_USER: &str = "update_user";
pub const DELETE_USER: &str = "delete_user";

/// Every pattern [`UserDispatcher`] answers
pub const PATTERNS: [&str; 5] = [
    CREATE_USER,
    FIND_ALL_USERS,
    FIND_ONE_USER,
    UPDATE_USER,
    DELETE_USER,
];

pub const NO_HANDLER_MESSAGE: &str =
    "There is no matching message handler defined in the remote service.";

/// Routes a pattern name to its service operation
pub struct UserDispatcher<R: UserRepository> {
    service: UserService<R>,
}

impl<R: UserRepository> Clone for UserDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<R: UserRepository> UserDispatcher<R> {
    pub fn new(service: UserService<R>) -> Self {
        Self { service }
    }

    /// Handle one request. The returned value is the reply body.
    pub async fn dispatch(&self, pattern: &str, payload: Value) -> UserResult<Value> {
        debug!(pattern, "Dispatching request");

        match pattern {
            CREATE_USER => {
                let input: CreateUser = bind(payload)?;
                reply(self.service.create_user(input).await?)
            }
            FIND_ALL_USERS => {
                let pagination: Pagination = bind(payload)?;
                reply(self.service.find_all(pagination).await?)
            }
            FIND_ONE_USER => {
                let UserId { id } = bind(payload)?;
                reply(self.service.find_one(id).await?)
            }
            UPDATE_USER => {
                let input: UpdateUser = bind(payload)?;
                reply(self.service.update_user(input.id, input).await?)
            }
            DELETE_USER => {
                let UserId { id } = bind(payload)?;
                reply(self.service.remove_user(id).await?)
            }
            _ => Err(UserError::NotFound(NO_HANDLER_MESSAGE.to_string())),
        }
    }
}

/// Deserialize and validate a payload. A missing payload reads as `{}`.
fn bind<T: DeserializeOwned + Validate>(payload: Value) -> UserResult<T> {
    let payload = match payload {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    let input: T = serde_json::from_value(payload)?;
    input.validate()?;
    Ok(input)
}

fn reply<T: Serialize>(value: T) -> UserResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to encode reply");
        UserError::Internal(INTERNAL_ERROR_MESSAGE.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use serde_json::json;

    fn dispatcher() -> UserDispatcher<InMemoryUserRepository> {
        UserDispatcher::new(UserService::new(InMemoryUserRepository::new()))
    }

    async fn create(d: &UserDispatcher<InMemoryUserRepository>, email: &str) -> Value {
        d.dispatch(
            CREATE_USER,
            json!({"first_name": "Ana", "last_name": "Lee", "email": email}),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_one() {
        let d = dispatcher();
        let created = create(&d, "ana@x.com").await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["active"], true);

        let found = d.dispatch(FIND_ONE_USER, json!({"id": "1"})).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_unknown_fields_rejected() {
        let d = dispatcher();
        let err = d
            .dispatch(
                CREATE_USER,
                json!({"first_name": "A", "last_name": "B", "email": "a@b.co", "role": "admin"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status().as_u16(), 400);
        assert!(err.message().contains("role"));
    }

    #[tokio::test]
    async fn test_find_all_without_payload_uses_defaults() {
        let d = dispatcher();
        create(&d, "ana@x.com").await;

        let page = d.dispatch(FIND_ALL_USERS, Value::Null).await.unwrap();
        assert_eq!(
            page["metadata"],
            json!({"page": 1, "limit": 10, "total_rows": 1, "last_page": 1})
        );
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_all_rejects_zero_page() {
        let d = dispatcher();
        let err = d
            .dispatch(FIND_ALL_USERS, json!({"page": 0}))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(msg) if msg.starts_with("page")));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let d = dispatcher();
        create(&d, "ana@x.com").await;

        let updated = d
            .dispatch(UPDATE_USER, json!({"id": 1, "first_name": "X"}))
            .await
            .unwrap();
        assert_eq!(updated["first_name"], "X");
        assert_eq!(updated["last_name"], "Lee");
        assert_eq!(updated["id"], 1);

        let removed = d.dispatch(DELETE_USER, json!({"id": 1})).await.unwrap();
        assert_eq!(removed["active"], false);

        let err = d.dispatch(FIND_ONE_USER, json!({"id": 1})).await.unwrap_err();
        assert_eq!(err, UserError::not_found());
    }

    #[tokio::test]
    async fn test_missing_id_is_validation_error() {
        let d = dispatcher();
        for pattern in [FIND_ONE_USER, DELETE_USER, UPDATE_USER] {
            let err = d.dispatch(pattern, json!({})).await.unwrap_err();
            assert!(matches!(err, UserError::Validation(_)), "{}", pattern);
        }
    }

    #[test]
    fn test_reply_encoding_failure_hides_detail() {
        let unencodable = std::collections::HashMap::from([((1, 2), "pair key")]);

        let err = reply(unencodable).unwrap_err();
        assert_eq!(err, UserError::Internal(INTERNAL_ERROR_MESSAGE.to_string()));
        assert_eq!(err.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_unknown_pattern() {
        let err = dispatcher()
            .dispatch("drop_users", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 404);
        assert_eq!(err.message(), NO_HANDLER_MESSAGE);
    }
}
