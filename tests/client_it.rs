// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Instant,
};
// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use object_gateway::{
	auth::TokenSecret,
	backend::PutOutcome,
	client::{ResilientClient, RetryPolicy},
	error::{ClientError, Error, RequestError},
	key::ObjectKey,
};

const TOKEN: &str = "ci-bot.6fUq5pXvP9Yw3Jb0RkT8mQ";

fn build_client(server: &MockServer, policy: RetryPolicy) -> ResilientClient {
	ResilientClient::new(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
		TokenSecret::new(TOKEN),
	)
	.expect("Client construction should succeed.")
	.with_policy(policy)
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
	RetryPolicy {
		max_attempts,
		initial_backoff: Duration::milliseconds(20),
		overall_budget: Duration::seconds(10),
	}
}

#[tokio::test]
async fn put_statuses_map_onto_outcomes() {
	let server = MockServer::start_async().await;
	let created = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/objects/fresh")
				.header("authorization", format!("Bearer {TOKEN}"))
				.body("payload");
			then.status(201);
		})
		.await;
	let overwritten = server
		.mock_async(|when, then| {
			when.method(PUT).path("/objects/taken");
			then.status(204);
		})
		.await;
	let client = build_client(&server, fast_policy(1));

	assert_eq!(
		client
			.put(&ObjectKey::from("fresh"), b"payload".to_vec())
			.await
			.expect("Put should succeed."),
		PutOutcome::Created
	);
	assert_eq!(
		client
			.put(&ObjectKey::from("taken"), b"payload".to_vec())
			.await
			.expect("Put should succeed."),
		PutOutcome::Overwritten
	);

	created.assert_async().await;
	overwritten.assert_async().await;
}

#[tokio::test]
async fn terminal_errors_are_never_retried() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/objects/missing");
			then.status(404)
				.header("content-type", "application/json")
				.body(r#"{"error":"not_found","message":"Object not found."}"#);
		})
		.await;
	let client = build_client(&server, fast_policy(5));
	let err = client
		.get(&ObjectKey::from("missing"))
		.await
		.expect_err("Missing object must fail.");

	assert!(matches!(err, Error::Request(RequestError::NotFound)));
	assert_eq!(err.status(), 404);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn retryable_errors_back_off_until_attempts_run_out() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/objects/flaky");
			then.status(503)
				.header("content-type", "application/json")
				.body(r#"{"error":"unavailable","message":"backend down"}"#);
		})
		.await;
	let client = build_client(&server, fast_policy(3));
	let started = Instant::now();
	let err = client
		.get(&ObjectKey::from("flaky"))
		.await
		.expect_err("Persistent 503 must exhaust retries.");
	let elapsed = started.elapsed();

	match err {
		Error::Client(ClientError::RetriesExhausted { attempts, last }) => {
			assert_eq!(attempts, 3);
			assert_eq!(last.status(), 503);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	// Two waits on the doubling schedule: 20ms then 40ms.
	assert!(elapsed.as_millis() >= 60, "Backoff too short: {elapsed:?}.");

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn transient_outages_recover_within_the_attempt_budget() {
	let server = MockServer::start_async().await;
	let failures = Arc::new(AtomicU32::new(0));
	let gate = failures.clone();
	// Mocks are matched in creation order, so this one answers the first two requests
	// and then stops matching.
	let outage = server
		.mock_async(move |when, then| {
			when.method(GET)
				.path("/objects/recovering")
				.is_true(move |_: &HttpMockRequest| gate.fetch_add(1, Ordering::SeqCst) < 2);
			then.status(503)
				.header("content-type", "application/json")
				.body(r#"{"error":"unavailable","message":"backend down"}"#);
		})
		.await;
	let recovered = server
		.mock_async(|when, then| {
			when.method(GET).path("/objects/recovering");
			then.status(200).body("payload");
		})
		.await;
	let client = build_client(&server, fast_policy(3));
	let started = Instant::now();
	let bytes = client
		.get(&ObjectKey::from("recovering"))
		.await
		.expect("The third attempt should succeed.");
	let elapsed = started.elapsed();

	assert_eq!(bytes, b"payload".to_vec());
	// Two waits on the doubling schedule: 20ms then 40ms.
	assert!(elapsed.as_millis() >= 60, "Backoff too short: {elapsed:?}.");

	outage.assert_calls_async(2).await;
	recovered.assert_calls_async(1).await;
}

#[tokio::test]
async fn bodyless_auth_failures_propagate_immediately() {
	let server = MockServer::start_async().await;
	// HEAD responses carry no body, so the status line alone must classify the failure.
	let mock = server
		.mock_async(|when, then| {
			when.method(httpmock::Method::HEAD).path("/objects/secret");
			then.status(403);
		})
		.await;
	let client = build_client(&server, fast_policy(3));
	let err = client
		.exists(&ObjectKey::from("secret"))
		.await
		.expect_err("Forbidden existence check must fail.");

	assert_eq!(err.status(), 403);
	assert!(!err.is_retryable());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn retry_after_hint_outranks_the_backoff_schedule() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/objects/throttled");
			then.status(429)
				.header("retry-after", "1")
				.header("content-type", "application/json")
				.body(r#"{"error":"rate_limited","message":"slow down","retry_after_secs":1}"#);
		})
		.await;

	let client = build_client(&server, fast_policy(2));
	let started = Instant::now();

	client
		.get(&ObjectKey::from("throttled"))
		.await
		.expect_err("Persistent 429 must exhaust retries.");

	// One wait happened; the 20ms schedule would finish well under a second.
	assert!(
		started.elapsed().as_millis() >= 1_000,
		"The server hint must override the local schedule."
	);
}

#[tokio::test]
async fn deadline_budget_refuses_unaffordable_waits() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/objects/busy");
			then.status(429)
				.header("retry-after", "30")
				.header("content-type", "application/json")
				.body(r#"{"error":"rate_limited","message":"slow down","retry_after_secs":30}"#);
		})
		.await;
	let client = build_client(&server, RetryPolicy {
		max_attempts: 5,
		initial_backoff: Duration::milliseconds(20),
		overall_budget: Duration::milliseconds(500),
	});
	let started = Instant::now();
	let err = client
		.get(&ObjectKey::from("busy"))
		.await
		.expect_err("An unaffordable wait must fail fast.");

	assert!(matches!(err, Error::Client(ClientError::DeadlineExceeded)));
	assert!(
		started.elapsed().as_millis() < 5_000,
		"The call must give up instead of sleeping past its budget."
	);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn keys_pager_follows_cursors_lazily() {
	let server = MockServer::start_async().await;
	let first_page = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/objects")
				.query_param("prefix", "a%2F")
				.query_param_missing("cursor");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"keys":["a%2F1","a%2F2"],"next_cursor":"abc123"}"#);
		})
		.await;
	let second_page = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/objects")
				.query_param("prefix", "a%2F")
				.query_param("cursor", "abc123");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"keys":["a%2F3"]}"#);
		})
		.await;
	let client = build_client(&server, fast_policy(1));
	let mut pages = client.keys(ObjectKey::from("a/"));
	let page = pages
		.next()
		.await
		.expect("First page should succeed.")
		.expect("First page should exist.");

	assert_eq!(page, vec![ObjectKey::from("a/1"), ObjectKey::from("a/2")]);

	// The second request only happens once the first page is consumed.
	first_page.assert_calls_async(1).await;
	second_page.assert_calls_async(0).await;

	let page = pages
		.next()
		.await
		.expect("Second page should succeed.")
		.expect("Second page should exist.");

	assert_eq!(page, vec![ObjectKey::from("a/3")]);
	assert!(
		pages.next().await.expect("Exhausted pager should succeed.").is_none(),
		"A page without a cursor ends the listing."
	);

	second_page.assert_calls_async(1).await;
}

#[tokio::test]
async fn typed_auth_errors_cross_the_wire() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/objects/protected");
			then.status(403).header("content-type", "application/json").body(
				r#"{"error":"insufficient_scope","message":"Token lacks the required scope: delete."}"#,
			);
		})
		.await;

	let client = build_client(&server, fast_policy(3));
	let err = client
		.delete(&ObjectKey::from("protected"))
		.await
		.expect_err("Forbidden delete must fail.");

	assert_eq!(err.status(), 403);
	assert!(!err.is_retryable());
}

#[tokio::test]
async fn health_probe_needs_no_credential() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/health");
			then.status(200);
		})
		.await;
	let client = build_client(&server, fast_policy(1));

	client.health().await.expect("Health probe should succeed.");

	mock.assert_async().await;
}
