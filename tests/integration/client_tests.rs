//! Lifecycle client integration tests
//!
//! Each operation runs against a wiremock stand-in for the Datadog v2 API,
//! verifying request flow and error classification.

use dd_user_sync::core::secrets::OrgCredential;
use dd_user_sync::{PlatformError, UsersClient};
use dd_user_sync::utils::retry::RetryableError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures;

fn acme_client(server: &MockServer) -> UsersClient {
    UsersClient::new(
        "Acme",
        OrgCredential {
            api_key: "acme-api".to_string(),
            app_key: "acme-app".to_string(),
        },
        fixtures::mock_config(server),
    )
    .unwrap()
}

#[tokio::test]
async fn invite_creates_user_and_sends_invitation() {
    let server = MockServer::start().await;
    fixtures::mount_roles(&server).await;
    fixtures::mount_create_user(&server, "user-1").await;
    fixtures::mount_invitations(&server).await;

    let client = acme_client(&server);
    client
        .invite("Alice", "alice@acme.io", "Standard")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert!(paths.contains(&"/api/v2/roles".to_string()));
    assert!(paths.contains(&"/api/v2/users".to_string()));
    assert!(paths.contains(&"/api/v2/user_invitations".to_string()));
}

#[tokio::test]
async fn invite_sends_credential_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/roles"))
        .and(header("DD-API-KEY", "acme-api"))
        .and(header("DD-APPLICATION-KEY", "acme-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "role-std", "type": "roles", "attributes": {"name": "Standard"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    fixtures::mount_create_user(&server, "user-1").await;
    fixtures::mount_invitations(&server).await;

    let client = acme_client(&server);
    client
        .invite("Alice", "alice@acme.io", "Standard")
        .await
        .unwrap();
}

#[tokio::test]
async fn role_resolution_is_cached_per_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "role-std", "type": "roles", "attributes": {"name": "Standard"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    fixtures::mount_create_user(&server, "user-1").await;
    fixtures::mount_invitations(&server).await;

    let client = acme_client(&server);
    client.invite("Alice", "alice@acme.io", "Standard").await.unwrap();
    // Second invite with the same role must reuse the cached role id
    client.invite("Bob", "bob@acme.io", "standard").await.unwrap();
}

#[tokio::test]
async fn invite_with_unknown_role_is_validation_rejected() {
    let server = MockServer::start().await;
    fixtures::mount_roles(&server).await;

    let client = acme_client(&server);
    let err = client
        .invite("Alice", "alice@acme.io", "Nonexistent Role")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::InvalidRequest { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn auth_rejection_maps_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/roles"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = acme_client(&server);
    let err = client
        .invite("Alice", "alice@acme.io", "Standard")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Authentication { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_carries_retry_after_hint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/roles"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"retry_after": 7})),
        )
        .mount(&server)
        .await;

    let client = acme_client(&server);
    let err = client
        .invite("Alice", "alice@acme.io", "Standard")
        .await
        .unwrap_err();

    match err {
        PlatformError::RateLimit { retry_after, .. } => assert_eq!(retry_after, Some(7)),
        other => panic!("Expected rate limit error, got {:?}", other),
    }
}

#[tokio::test]
async fn disable_deletes_matching_user() {
    let server = MockServer::start().await;
    fixtures::mount_users(
        &server,
        fixtures::users_page(&[("user-7", "Alice", "Alice@Acme.io")]),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/users/user-7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = acme_client(&server);
    // Email match is case-insensitive
    client.disable("alice@acme.io").await.unwrap();
}

#[tokio::test]
async fn disable_of_absent_user_is_not_found() {
    let server = MockServer::start().await;
    fixtures::mount_users(&server, fixtures::users_page(&[])).await;

    let client = acme_client(&server);
    let err = client.disable("ghost@acme.io").await.unwrap_err();

    assert!(matches!(err, PlatformError::NotFound { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn list_pending_follows_pagination_and_filters_status() {
    let server = MockServer::start().await;

    // Second page, matched by its cursor parameter; mounted first so the
    // generic first-page mock does not swallow it
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("page[cursor]", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "u-3", "type": "users", "attributes": {"name": "Carol", "email": "carol@acme.io", "status": "Pending"}}
            ],
            "links": {}
        })))
        .mount(&server)
        .await;

    let next = format!("{}/api/v2/users?page[cursor]=c2", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "u-1", "type": "users", "attributes": {"name": "Alice", "email": "alice@acme.io", "status": "Pending"}},
                {"id": "u-2", "type": "users", "attributes": {"name": "Bob", "email": "bob@acme.io", "status": "Active"}}
            ],
            "links": {"next": next}
        })))
        .mount(&server)
        .await;

    let client = acme_client(&server);
    let pending = client.list_pending().await.unwrap();

    let emails: Vec<_> = pending.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["alice@acme.io", "carol@acme.io"]);
}
