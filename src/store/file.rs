//! File-backed [`TokenStore`] for lightweight deployments.
//!
//! The whole registry is rewritten on every mutation through a temp file + rename, so a
//! reader that opens the path mid-write sees either the previous snapshot or the new
//! one, never a torn rewrite. The snapshot file is shared with out-of-process admin
//! tooling: its mtime is checked before every read and rewrite, and the in-memory view
//! reloads whenever another writer has replaced the file.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
	time::SystemTime,
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenId, TokenRecord, TokenSecret},
	store::{self, StoreError, StoreFuture, TokenStore},
};

/// In-memory view of the snapshot file together with the mtime it was loaded from.
#[derive(Debug)]
struct Cached {
	records: HashMap<TokenId, TokenRecord>,
	modified: Option<SystemTime>,
}

/// Persists token records to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Cached>>,
}
impl FileStore {
	/// Opens (or creates) a registry at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let records = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };
		let modified = Self::snapshot_mtime(&path);

		Ok(Self { path, inner: Arc::new(RwLock::new(Cached { records, modified })) })
	}

	fn snapshot_mtime(path: &Path) -> Option<SystemTime> {
		fs::metadata(path).ok().and_then(|meta| meta.modified().ok())
	}

	/// Reloads the snapshot when another writer has replaced the file since the last
	/// load. A missing file reads as an empty registry.
	fn refresh_locked(&self, cached: &mut Cached) -> Result<(), StoreError> {
		let modified = Self::snapshot_mtime(&self.path);

		if modified == cached.modified {
			return Ok(());
		}

		cached.records = Self::load_snapshot(&self.path)?;
		cached.modified = modified;

		Ok(())
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<TokenId, TokenRecord>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Persistence {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Persistence {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		let entries: Vec<TokenRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|record| (record.id.clone(), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Persistence {
				message: format!("Failed to create registry directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, cached: &mut Cached) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut snapshot: Vec<_> = cached.records.values().collect();

		snapshot.sort_by(|a, b| a.id.cmp(&b.id));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize registry snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Persistence {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Persistence {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Persistence {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Persistence {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})?;

		cached.modified = Self::snapshot_mtime(&self.path);

		Ok(())
	}
}
impl TokenStore for FileStore {
	fn create(
		&self,
		id: TokenId,
		scope: ScopeSet,
		ttl: Duration,
	) -> StoreFuture<'_, (TokenSecret, TokenRecord)> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.refresh_locked(&mut guard)?;

			let issued =
				store::issue_into(&mut guard.records, id, scope, ttl, OffsetDateTime::now_utc())?;

			self.persist_locked(&mut guard)?;

			Ok(issued)
		})
	}

	fn validate<'a>(&'a self, presented: &'a TokenSecret) -> StoreFuture<'a, TokenRecord> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.refresh_locked(&mut guard)?;

			store::validate_in(&guard.records, presented, OffsetDateTime::now_utc())
		})
	}

	fn revoke<'a>(&'a self, id: &'a TokenId) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.refresh_locked(&mut guard)?;

			// Idempotent: revoking an unknown id changes nothing.
			if let Some(record) = guard.records.get_mut(id) {
				record.revoke(OffsetDateTime::now_utc());
				self.persist_locked(&mut guard)?;
			}

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"object_gateway_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn create_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let id = TokenId::new("ci-bot").expect("Identifier fixture should be valid.");
		let scope = ScopeSet::new(["read", "write"]).expect("Scope fixture should be valid.");
		let (secret, _) = rt
			.block_on(store.create(id.clone(), scope, Duration::hours(1)))
			.expect("Failed to create fixture token in file store.");

		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let record = rt
			.block_on(reopened.validate(&secret))
			.expect("Reopened file store should validate the issued token.");

		assert_eq!(record.id, id);

		rt.block_on(reopened.revoke(&id)).expect("Revocation should persist.");

		let reopened = FileStore::open(&path).expect("Failed to reopen after revocation.");

		rt.block_on(reopened.validate(&secret))
			.expect_err("Revoked token must fail validation after reload.");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary registry snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let id = TokenId::new("ci-bot").expect("Identifier fixture should be valid.");
		let scope = ScopeSet::new(["read"]).expect("Scope fixture should be valid.");

		rt.block_on(store.create(id.clone(), scope.clone(), Duration::hours(1)))
			.expect("First creation should succeed.");
		rt.block_on(store.create(id, scope, Duration::hours(1)))
			.expect_err("Duplicate id must be rejected.");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary registry snapshot {}: {e}", path.display())
		});
	}
}
