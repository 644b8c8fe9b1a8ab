//! Batch orchestration integration tests
//!
//! End-to-end runs of the processor over a wiremock Datadog API, covering
//! the partial-failure properties: one outcome per record in input order, no
//! record failure aborting the batch, and bounded retries with recorded
//! attempt counts.

use std::sync::Arc;

use dd_user_sync::core::batch::codes;
use dd_user_sync::utils::retry::RetryConfig;
use dd_user_sync::{
    BatchProcessor, OutcomeStatus, Settings, UserAction, UserSync, parse_records,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures;
use crate::common::{FailingSecretStore, StaticSecretStore};

#[tokio::test]
async fn disable_single_row_succeeds() {
    let server = MockServer::start().await;
    fixtures::mount_users(
        &server,
        fixtures::users_page(&[("user-1", "Alice", "alice@acme.io")]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/users/user-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let csv = "name,email,org,role\nAlice,alice@acme.io,Acme,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Disable).unwrap();

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap();
    let result = processor.run(UserAction::Disable, records).await;

    assert_eq!(result.counts.total, 1);
    assert_eq!(result.counts.succeeded, 1);
    assert_eq!(result.outcomes[0].status, OutcomeStatus::Succeeded);
}

#[tokio::test]
async fn unknown_org_fails_without_outbound_call() {
    let server = MockServer::start().await;

    let csv = "name,email,org,role\nHank,hank@globex.io,Globex,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Invite).unwrap();

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap();
    let result = processor.run(UserAction::Invite, records).await;

    assert_eq!(result.counts.failed, 1);
    assert_eq!(
        result.outcomes[0].error.as_ref().unwrap().code,
        codes::ORG_NOT_FOUND
    );
    // No request may have reached the platform
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn outcomes_preserve_input_order_and_length() {
    let server = MockServer::start().await;
    fixtures::mount_roles(&server).await;
    fixtures::mount_create_user(&server, "user-1").await;
    fixtures::mount_invitations(&server).await;

    let csv = "name,email,org,role\n\
               Alice,alice@acme.io,Acme,Standard\n\
               broken-row,,,\n\
               Hank,hank@globex.io,Globex,Standard\n\
               Bob,bob@acme.io,Acme,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Invite).unwrap();
    assert_eq!(records.len(), 4);

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap();
    let result = processor.run(UserAction::Invite, records).await;

    assert_eq!(result.counts.total, 4);
    let lines: Vec<_> = result.outcomes.iter().map(|o| o.record.line).collect();
    assert_eq!(lines, vec![2, 3, 4, 5]);

    assert_eq!(result.outcomes[0].status, OutcomeStatus::Succeeded);
    assert_eq!(
        result.outcomes[1].error.as_ref().unwrap().code,
        codes::MALFORMED_INPUT
    );
    assert_eq!(
        result.outcomes[2].error.as_ref().unwrap().code,
        codes::ORG_NOT_FOUND
    );
    // A bad row and an unknown org never block the rows after them
    assert_eq!(result.outcomes[3].status, OutcomeStatus::Succeeded);

    assert_eq!(result.counts.succeeded, 2);
    assert_eq!(result.counts.failed, 2);
}

#[tokio::test]
async fn retryable_failure_succeeds_on_third_attempt() {
    let server = MockServer::start().await;
    fixtures::mount_users(
        &server,
        fixtures::users_page(&[("user-1", "Alice", "alice@acme.io")]),
    )
    .await;

    // Two 503s, then success
    Mock::given(method("DELETE"))
        .and(path("/api/v2/users/user-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/users/user-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let csv = "name,email,org,role\nAlice,alice@acme.io,Acme,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Disable).unwrap();

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap()
    .with_retry(RetryConfig::fast());
    let result = processor.run(UserAction::Disable, records).await;

    assert_eq!(result.outcomes[0].status, OutcomeStatus::Succeeded);
    assert_eq!(result.outcomes[0].attempts, 3);
}

#[tokio::test]
async fn non_retryable_rejection_fails_after_one_attempt() {
    let server = MockServer::start().await;
    fixtures::mount_roles(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/users"))
        .respond_with(ResponseTemplate::new(400).set_body_string("email already exists"))
        .expect(1)
        .mount(&server)
        .await;

    let csv = "name,email,org,role\nAlice,alice@acme.io,Acme,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Invite).unwrap();

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap()
    .with_retry(RetryConfig::fast());
    let result = processor.run(UserAction::Invite, records).await;

    let outcome = &result.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(
        outcome.error.as_ref().unwrap().code,
        codes::VALIDATION_REJECTED
    );
}

#[tokio::test]
async fn secret_unavailable_fails_every_record_via_facade() {
    let settings = Settings::default();
    let sync = UserSync::with_store(settings, Arc::new(FailingSecretStore));

    let csv = "name,email,org,role\nAlice,alice@acme.io,Acme,Standard\nBob,bob@acme.io,Acme,Standard\n";
    let result = sync
        .process_upload("delete_user.csv", csv.as_bytes())
        .await
        .unwrap()
        .expect("delete_user.csv selects the disable action");

    assert_eq!(result.action, UserAction::Disable);
    assert_eq!(result.counts.total, 2);
    assert_eq!(result.counts.failed, 2);
    for outcome in &result.outcomes {
        assert_eq!(
            outcome.error.as_ref().unwrap().code,
            codes::SECRET_UNAVAILABLE
        );
    }
}

#[tokio::test]
async fn unmatched_object_key_is_ignored() {
    let sync = UserSync::with_store(
        Settings::default(),
        Arc::new(StaticSecretStore::new(fixtures::SECRET_DOC)),
    );

    let result = sync.process_upload("report.csv", b"name,email,org,role\n").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn unreadable_file_aborts_the_invocation() {
    let sync = UserSync::with_store(
        Settings::default(),
        Arc::new(StaticSecretStore::new(fixtures::SECRET_DOC)),
    );

    // Header is missing the org column: fatal, no batch result
    let err = sync
        .process_upload("create_user.csv", b"name,email,role\n")
        .await
        .unwrap_err();
    assert!(matches!(err, dd_user_sync::SyncError::MalformedInput(_)));
}

#[tokio::test]
async fn expired_deadline_skips_remaining_records() {
    let server = MockServer::start().await;

    let csv = "name,email,org,role\nAlice,alice@acme.io,Acme,Standard\nBob,bob@acme.io,Acme,Standard\n";
    let records = parse_records(csv.as_bytes(), UserAction::Disable).unwrap();

    let mut processor = BatchProcessor::new(
        Ok(fixtures::acme_directory()),
        fixtures::mock_config(&server),
    )
    .unwrap()
    .with_deadline(tokio::time::Instant::now());
    let result = processor.run(UserAction::Disable, records).await;

    assert_eq!(result.counts.total, 2);
    assert_eq!(result.counts.skipped, 2);
    assert!(server.received_requests().await.unwrap().is_empty());
}
