// std
use std::{env, fs, path::PathBuf, process};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use object_gateway::{
	auth::{ScopeSet, TokenId},
	store::{FileStore, TokenStore},
};

fn temp_path(tag: &str) -> PathBuf {
	let unique = format!(
		"object_gateway_it_{tag}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	);

	env::temp_dir().join(unique)
}

fn fixture_id() -> TokenId {
	TokenId::new("deploy-bot").expect("Identifier fixture should be valid.")
}

fn fixture_scope() -> ScopeSet {
	ScopeSet::new(["read", "write"]).expect("Scope fixture should be valid.")
}

#[tokio::test]
async fn snapshots_never_contain_plaintext_secrets() {
	let path = temp_path("plaintext");
	let store = FileStore::open(&path).expect("Opening the registry should succeed.");
	let (secret, record) = store
		.create(fixture_id(), fixture_scope(), Duration::hours(1))
		.await
		.expect("Token creation should succeed.");
	let (_, secret_half) = secret.split().expect("Presented token should split on `.`.");
	let snapshot = fs::read_to_string(&path).expect("Snapshot should be readable.");

	assert!(
		!snapshot.contains(secret_half),
		"The snapshot must only hold the salted digest, never the secret."
	);
	assert!(snapshot.contains(record.id.as_ref()), "Metadata stays readable in the snapshot.");
	assert!(snapshot.contains(&record.secret.digest));

	fs::remove_file(&path).expect("Snapshot should be removable.");
}

#[tokio::test]
async fn registry_state_survives_reopen() {
	let path = temp_path("reopen");
	let (secret, other_secret) = {
		let store = FileStore::open(&path).expect("Opening the registry should succeed.");
		let (secret, _) = store
			.create(fixture_id(), fixture_scope(), Duration::hours(1))
			.await
			.expect("First creation should succeed.");
		let other = TokenId::new("backup-bot").expect("Identifier fixture should be valid.");
		let (other_secret, _) = store
			.create(other.clone(), fixture_scope(), Duration::hours(1))
			.await
			.expect("Second creation should succeed.");

		store.revoke(&other).await.expect("Revocation should succeed.");

		(secret, other_secret)
	};
	let reopened = FileStore::open(&path).expect("Reopening the registry should succeed.");
	let record = reopened
		.validate(&secret)
		.await
		.expect("The untouched token must survive the reload.");

	assert_eq!(record.id, fixture_id());
	assert_eq!(record.scope, fixture_scope());

	reopened
		.validate(&other_secret)
		.await
		.expect_err("The revocation must survive the reload too.");

	fs::remove_file(&path).expect("Snapshot should be removable.");
}

#[tokio::test]
async fn revoking_an_unknown_id_is_a_quiet_no_op() {
	let path = temp_path("unknown-revoke");
	let store = FileStore::open(&path).expect("Opening the registry should succeed.");
	let ghost = TokenId::new("ghost").expect("Identifier fixture should be valid.");

	store.revoke(&ghost).await.expect("Revoking an unknown id should succeed.");

	assert!(!path.exists(), "A no-op revocation must not create a snapshot.");
}

#[tokio::test]
async fn non_positive_ttls_are_rejected() {
	let path = temp_path("bad-ttl");
	let store = FileStore::open(&path).expect("Opening the registry should succeed.");

	store
		.create(fixture_id(), fixture_scope(), Duration::ZERO)
		.await
		.expect_err("A zero TTL must be rejected.");
	store
		.create(fixture_id(), fixture_scope(), Duration::seconds(-5))
		.await
		.expect_err("A negative TTL must be rejected.");
	assert!(!path.exists(), "Nothing must be persisted for rejected creations.");
}

#[tokio::test]
async fn externally_minted_tokens_take_effect_without_reopening() {
	let path = temp_path("external-mint");
	let store = FileStore::open(&path).expect("Opening the registry should succeed.");
	// A second handle on the same file stands in for the out-of-process admin command.
	let admin = FileStore::open(&path).expect("Opening the admin handle should succeed.");
	let (secret, _) = admin
		.create(fixture_id(), fixture_scope(), Duration::hours(1))
		.await
		.expect("Admin-side creation should succeed.");
	let record = store
		.validate(&secret)
		.await
		.expect("A token minted by another writer must validate without a reopen.");

	assert_eq!(record.id, fixture_id());

	fs::remove_file(&path).expect("Snapshot should be removable.");
}

#[tokio::test]
async fn rewrites_keep_records_added_by_a_concurrent_writer() {
	let path = temp_path("concurrent-writers");
	let first = FileStore::open(&path).expect("Opening the registry should succeed.");
	let second = FileStore::open(&path).expect("Opening the second handle should succeed.");
	let (first_secret, _) = first
		.create(fixture_id(), fixture_scope(), Duration::hours(1))
		.await
		.expect("First creation should succeed.");
	let other = TokenId::new("backup-bot").expect("Identifier fixture should be valid.");
	let (second_secret, _) = second
		.create(other, fixture_scope(), Duration::hours(1))
		.await
		.expect("Creation through the second handle should succeed.");

	// The first handle's rewrite must fold in the record the second handle added.
	first.revoke(&fixture_id()).await.expect("Revocation should succeed.");

	let reopened = FileStore::open(&path).expect("Reopening the registry should succeed.");

	reopened
		.validate(&second_secret)
		.await
		.expect("The other writer's record must survive the rewrite.");
	reopened
		.validate(&first_secret)
		.await
		.expect_err("The revocation itself must persist.");

	fs::remove_file(&path).expect("Snapshot should be removable.");
}

#[tokio::test]
async fn empty_snapshot_files_load_as_an_empty_registry() {
	let path = temp_path("empty");

	fs::write(&path, b"").expect("Fixture file should be writable.");

	let store = FileStore::open(&path).expect("An empty snapshot should open cleanly.");

	store
		.create(fixture_id(), fixture_scope(), Duration::hours(1))
		.await
		.expect("Creation into the empty registry should succeed.");

	fs::remove_file(&path).expect("Snapshot should be removable.");
}
