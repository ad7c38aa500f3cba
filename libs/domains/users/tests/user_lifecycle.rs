use domain_users::handlers::{CREATE_USER, DELETE_USER, FIND_ALL_USERS, FIND_ONE_USER, UPDATE_USER};
use domain_users::{
    CreateUser, InMemoryUserRepository, Pagination, UpdateUser, UserDispatcher, UserError,
    UserService,
};
use serde_json::json;

fn service() -> UserService<InMemoryUserRepository> {
    UserService::new(InMemoryUserRepository::new())
}

fn create_input(first: &str, email: &str) -> CreateUser {
    CreateUser {
        first_name: first.to_string(),
        last_name: "Lee".to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn test_ana_lee_scenario() {
    let dispatcher = UserDispatcher::new(service());

    let created = dispatcher
        .dispatch(
            CREATE_USER,
            json!({"first_name": "Ana", "last_name": "Lee", "email": "ana@x.com"}),
        )
        .await
        .unwrap();
    assert_eq!(
        created,
        json!({"id": 1, "first_name": "Ana", "last_name": "Lee", "email": "ana@x.com", "active": true})
    );

    let duplicate = dispatcher
        .dispatch(
            CREATE_USER,
            json!({"first_name": "Ana", "last_name": "Lee", "email": "ana@x.com"}),
        )
        .await
        .unwrap_err();
    assert_eq!(duplicate.to_fault().status, 409);
    assert_eq!(duplicate.message(), "Email 'ana@x.com' is already in use.");

    let page = dispatcher
        .dispatch(FIND_ALL_USERS, json!({"page": 1, "limit": 10}))
        .await
        .unwrap();
    assert_eq!(page["data"], json!([created]));
    assert_eq!(
        page["metadata"],
        json!({"page": 1, "limit": 10, "total_rows": 1, "last_page": 1})
    );

    let removed = dispatcher.dispatch(DELETE_USER, json!({"id": 1})).await.unwrap();
    assert_eq!(removed["active"], false);

    let gone = dispatcher
        .dispatch(FIND_ONE_USER, json!({"id": 1}))
        .await
        .unwrap_err();
    assert_eq!(gone.to_fault().status, 404);
    assert_eq!(gone.message(), "Resource not found");
}

#[tokio::test]
async fn test_find_all_pages_hold_at_most_limit_and_skip_inactive() {
    let service = service();
    for i in 0..23 {
        service
            .create_user(create_input("User", &format!("user{}@x.com", i)))
            .await
            .unwrap();
    }
    for id in [2, 9, 17] {
        service.remove_user(id).await.unwrap();
    }

    for limit in [1_i64, 3, 7, 10, 20, 50] {
        let first = service.find_all(Pagination::new(1, limit)).await.unwrap();
        let total = first.metadata.total_rows;
        assert_eq!(total, 20);
        assert_eq!(first.metadata.last_page, total.div_ceil(limit as u64));

        let mut seen = 0;
        for page in 1..=first.metadata.last_page as i64 + 1 {
            let result = service.find_all(Pagination::new(page, limit)).await.unwrap();
            assert!(result.data.len() as i64 <= limit);
            assert!(result.data.iter().all(|u| u.active));
            seen += result.data.len();
        }
        assert_eq!(seen as u64, total);
    }
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let service = service();
    let original = service
        .create_user(create_input("Ana", "ana@x.com"))
        .await
        .unwrap();

    let updated = service
        .update_user(
            original.id,
            UpdateUser {
                id: original.id + 100,
                first_name: Some("X".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.first_name, "X");
    assert_eq!(updated.last_name, original.last_name);
    assert_eq!(updated.email, original.email);
    assert_eq!(updated.active, original.active);

    let missing = service
        .update_user(
            999,
            UpdateUser {
                id: 999,
                first_name: Some("X".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(missing, UserError::not_found());
}

#[tokio::test]
async fn test_update_body_id_never_retargets() {
    let dispatcher = UserDispatcher::new(service());
    for email in ["a@x.com", "b@x.com"] {
        dispatcher
            .dispatch(
                CREATE_USER,
                json!({"first_name": "A", "last_name": "B", "email": email}),
            )
            .await
            .unwrap();
    }

    let updated = dispatcher
        .dispatch(UPDATE_USER, json!({"id": "2", "last_name": "Z"}))
        .await
        .unwrap();
    assert_eq!(updated["id"], 2);

    let untouched = dispatcher.dispatch(FIND_ONE_USER, json!({"id": 1})).await.unwrap();
    assert_eq!(untouched["last_name"], "B");
}

#[tokio::test]
async fn test_email_stays_reserved_after_soft_delete() {
    let service = service();
    let user = service
        .create_user(create_input("Ana", "ana@x.com"))
        .await
        .unwrap();
    service.remove_user(user.id).await.unwrap();

    let err = service
        .create_user(create_input("Ana", "ana@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Conflict(msg) if msg.contains("ana@x.com")));
}
