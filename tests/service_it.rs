// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use object_gateway::{
	auth::{ScopeSet, TokenId},
	backend::{MemoryBackend, PutOutcome, memory::FlakyBackend},
	error::{AuthError, Error},
	gate::AuthGate,
	service::{ListQuery, ObjectService},
	store::{MemoryStore, TokenStore},
	throttle::RateLimiter,
};

struct Fixture {
	service: ObjectService,
	registry: Arc<MemoryStore>,
	id: TokenId,
	auth: String,
}

async fn build_fixture(scopes: &[&str]) -> Fixture {
	let registry = Arc::new(MemoryStore::default());
	let id = TokenId::new("it-bot").expect("Identifier fixture should be valid.");
	let scope = ScopeSet::new(scopes.iter().copied()).expect("Scope fixture should be valid.");
	let (secret, _) = registry
		.create(id.clone(), scope, Duration::hours(1))
		.await
		.expect("Token creation should succeed.");
	let service = ObjectService::new(
		Arc::new(MemoryBackend::default()),
		AuthGate::new(registry.clone()),
		RateLimiter::new(1_000., 1_000.),
	);

	Fixture { service, registry, id, auth: format!("Bearer {}", secret.expose()) }
}

#[tokio::test]
async fn object_lifecycle_reports_every_transition() {
	let fx = build_fixture(&["read", "write", "delete"]).await;
	let auth = Some(fx.auth.as_str());

	assert_eq!(
		fx.service.put(auth, "doc", b"v1".to_vec()).await.expect("First put should succeed."),
		PutOutcome::Created
	);
	assert_eq!(
		fx.service.put(auth, "doc", b"v2".to_vec()).await.expect("Second put should succeed."),
		PutOutcome::Overwritten
	);
	assert_eq!(
		fx.service.get(auth, "doc").await.expect("Get should succeed."),
		b"v2".to_vec(),
		"The overwrite must be visible to the next read."
	);
	assert!(fx.service.head(auth, "doc").await.expect("Head should succeed."));

	fx.service.delete(auth, "doc").await.expect("Delete should succeed.");

	assert!(!fx.service.head(auth, "doc").await.expect("Head should succeed."));
	assert_eq!(
		fx.service.get(auth, "doc").await.expect_err("Deleted key must be gone.").status(),
		404
	);
}

#[tokio::test]
async fn missing_and_malformed_credentials_are_unauthorized() {
	let fx = build_fixture(&["read"]).await;
	let err = fx
		.service
		.get(None, "anything")
		.await
		.expect_err("A request without credentials must fail.");

	assert!(matches!(err, Error::Auth(AuthError::MissingCredentials)));
	assert_eq!(err.status(), 401);

	let err = fx
		.service
		.get(Some("Bearer it-bot.wrong-secret"), "anything")
		.await
		.expect_err("A wrong secret must fail.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidToken)));
}

#[tokio::test]
async fn revocation_takes_effect_on_the_next_request() {
	let fx = build_fixture(&["read", "write"]).await;
	let auth = Some(fx.auth.as_str());

	fx.service.put(auth, "doc", b"v".to_vec()).await.expect("Put should succeed.");
	fx.registry.revoke(&fx.id).await.expect("Revocation should succeed.");

	let err = fx
		.service
		.get(auth, "doc")
		.await
		.expect_err("A revoked token must be rejected.");

	assert!(matches!(err, Error::Auth(AuthError::Revoked)));
	assert_eq!(err.status(), 401);
}

#[tokio::test]
async fn listing_is_prefix_scoped_and_byte_ordered() {
	let fx = build_fixture(&["read", "write"]).await;
	let auth = Some(fx.auth.as_str());

	// Seeded out of order on purpose; "a/~" sorts after "a/b" bytewise.
	for key in ["a%2F~end", "a%2Fb", "b%2Fother", "a%2Fa"] {
		fx.service.put(auth, key, b"v".to_vec()).await.expect("Seeding should succeed.");
	}

	let page = fx
		.service
		.list(auth, ListQuery { prefix: Some("a%2F"), cursor: None, limit: None })
		.await
		.expect("Listing should succeed.");
	let encoded: Vec<_> = page.keys.iter().map(|key| key.encoded()).collect();

	assert_eq!(encoded, vec!["a%2Fa", "a%2Fb", "a%2F~end"]);
	assert!(page.next_cursor.is_none(), "A complete page must not mint a cursor.");
}

#[tokio::test]
async fn backend_outages_surface_as_retryable_errors() {
	let registry = Arc::new(MemoryStore::default());
	let id = TokenId::new("it-bot").expect("Identifier fixture should be valid.");
	let scope = ScopeSet::new(["read"]).expect("Scope fixture should be valid.");
	let (secret, _) = registry
		.create(id, scope, Duration::hours(1))
		.await
		.expect("Token creation should succeed.");
	let service = ObjectService::new(
		Arc::new(FlakyBackend::new(MemoryBackend::default(), 1)),
		AuthGate::new(registry),
		RateLimiter::new(1_000., 1_000.),
	);
	let auth = format!("Bearer {}", secret.expose());
	let err = service
		.get(Some(&auth), "k")
		.await
		.expect_err("The injected outage must surface.");

	assert_eq!(err.status(), 503);
	assert!(err.is_retryable(), "An outage is exactly what clients should retry.");

	// The wrapper recovers after the injected failure; absence is then a plain 404.
	let err = service.get(Some(&auth), "k").await.expect_err("The key was never written.");

	assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn tokens_are_validated_not_trusted() {
	// Two registries, same id: a token minted by one must not pass the other's gate.
	let fx = build_fixture(&["read"]).await;
	let foreign = Arc::new(MemoryStore::default());
	let id = TokenId::new("it-bot").expect("Identifier fixture should be valid.");
	let scope = ScopeSet::new(["read"]).expect("Scope fixture should be valid.");
	let (foreign_secret, _) = foreign
		.create(id, scope, Duration::hours(1))
		.await
		.expect("Token creation should succeed.");
	let header = format!("Bearer {}", foreign_secret.expose());
	let err = fx
		.service
		.get(Some(&header), "anything")
		.await
		.expect_err("A foreign token must fail against this registry.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidToken)));
}
