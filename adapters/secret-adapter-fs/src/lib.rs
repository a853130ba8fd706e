//! Filesystem-backed secret store
//!
//! Every secret lives in its own `<name>.json` file below the base directory.
//! Writes go to a temporary file first and are committed with a rename, so a
//! reader sees either the old or the new version, never a partial one.
//!
//! The commit runs on the blocking pool and holds the write lock until it is
//! done, so dropping a `set_secret` future never leaves a half-written
//! temporary file behind.

use std::{
	io::Write,
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
	fs::{create_dir_all, read_dir, remove_file, File},
	io::AsyncReadExt,
	sync::Mutex,
};
use tokio_util::sync::CancellationToken;

use evermail_types::{
	prelude::*,
	secret_adapter::{
		check_cancelled, validate_secret_name, with_cancel, Secret, SecretAdapter,
		SecretProperties,
	},
};

const EXT: &str = "json";
const TMP_PREFIX: &str = "tmp-";

/// On-disk representation of a secret
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretRecord {
	version: u64,
	updated_at: i64,
	value: String,
}

fn secret_file_path(base_dir: &Path, name: &str) -> EmResult<PathBuf> {
	validate_secret_name(name)?;
	Ok(base_dir.join(format!("{}.{}", name, EXT)))
}

fn parse_record(name: &str, buf: &[u8]) -> EmResult<SecretRecord> {
	serde_json::from_slice(buf).map_err(|e| {
		warn!(secret = %name, error = %e, "corrupt secret file");
		Error::Internal(format!("corrupt secret file for '{}'", name))
	})
}

/// Writes the next version of a secret. Must be called with the write lock held.
///
/// Cancellation is checked before the temporary file is created and again
/// before the rename. `Error::Cancelled` therefore always means nothing was
/// committed, and the temporary file is removed on every failure.
fn commit_record(
	path: &Path,
	tmp_path: &Path,
	name: &str,
	value: &str,
	cancel: Option<&CancellationToken>,
) -> EmResult<SecretProperties> {
	let current = match std::fs::read(path) {
		Ok(buf) => Some(parse_record(name, &buf)?),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
		Err(e) => return Err(e.into()),
	};
	let version = current.map_or(0, |r| r.version) + 1;
	let updated_at = Timestamp::now();
	let record = SecretRecord { version, updated_at: updated_at.0, value: value.to_string() };
	let data = serde_json::to_vec(&record)?;

	let res = (|| {
		check_cancelled(cancel)?;
		let mut file = std::fs::File::create(tmp_path)?;
		file.write_all(&data)?;
		file.sync_all()?;
		check_cancelled(cancel)?;
		std::fs::rename(tmp_path, path)?;
		Ok::<(), Error>(())
	})();
	if let Err(e) = res {
		if matches!(e, Error::Cancelled) {
			debug!(secret = %name, "secret write cancelled before commit");
		} else {
			warn!(secret = %name, error = %e, "secret write failed, removing tmpfile");
		}
		match std::fs::remove_file(tmp_path) {
			Ok(()) => {}
			Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
			Err(rm) => warn!(path = ?tmp_path, error = %rm, "failed to remove tmpfile"),
		}
		return Err(e);
	}
	debug!(secret = %name, version, "secret stored");

	Ok(SecretProperties { name: name.into(), version, updated_at })
}

#[derive(Debug)]
pub struct SecretAdapterFs {
	base_dir: Box<Path>,
	// serializes read-modify-write cycles of version numbers
	write_lock: Arc<Mutex<()>>,
	tmp_seq: AtomicU64,
}

impl SecretAdapterFs {
	pub async fn new(base_dir: Box<Path>) -> EmResult<Self> {
		create_dir_all(&base_dir).await?;

		// Leftovers of writes interrupted before their commit
		let mut dir = read_dir(&base_dir).await?;
		while let Some(entry) = dir.next_entry().await? {
			if entry.file_name().to_string_lossy().starts_with(TMP_PREFIX) {
				info!("removing stale tmpfile: {:?}", entry.path());
				remove_file(entry.path()).await?;
			}
		}

		Ok(Self { base_dir, write_lock: Arc::new(Mutex::new(())), tmp_seq: AtomicU64::new(0) })
	}

	async fn read_record(&self, name: &str) -> EmResult<Option<SecretRecord>> {
		let path = secret_file_path(&self.base_dir, name)?;
		let mut file = match File::open(&path).await {
			Ok(file) => file,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		let mut buf = Vec::new();
		file.read_to_end(&mut buf).await?;
		Ok(Some(parse_record(name, &buf)?))
	}

	async fn write_record(
		&self,
		name: &str,
		value: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		let path = secret_file_path(&self.base_dir, name)?;
		let guard = with_cancel(cancel, async {
			Ok(Arc::clone(&self.write_lock).lock_owned().await)
		})
		.await?;

		let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
		let tmp_path = self.base_dir.join(format!("{}{}-{}", TMP_PREFIX, name, seq));
		let (name, value, cancel) = (name.to_string(), value.to_string(), cancel.cloned());

		// Runs to completion even if this future is dropped
		tokio::task::spawn_blocking(move || {
			let _guard = guard;
			commit_record(&path, &tmp_path, &name, &value, cancel.as_ref())
		})
		.await
		.map_err(|e| Error::Internal(format!("secret write task failed: {}", e)))?
	}
}

#[async_trait]
impl SecretAdapter for SecretAdapterFs {
	async fn set_secret(
		&self,
		name: &str,
		value: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		self.write_record(name, value, cancel).await
	}

	async fn get_secret(
		&self,
		name: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		let record = with_cancel(cancel, self.read_record(name)).await?;
		Ok(record.map(|r| Secret {
			properties: SecretProperties {
				name: name.into(),
				version: r.version,
				updated_at: Timestamp(r.updated_at),
			},
			value: r.value.into(),
		}))
	}

	async fn list_secrets(
		&self,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		let mut names = Vec::new();
		let mut dir = read_dir(&self.base_dir).await?;
		while let Some(entry) = dir.next_entry().await? {
			check_cancelled(cancel)?;
			let path = entry.path();
			if path.extension().and_then(|e| e.to_str()) != Some(EXT) {
				continue;
			}
			let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
				continue;
			};
			if name.starts_with(TMP_PREFIX) || validate_secret_name(name).is_err() {
				continue;
			}
			names.push(name.to_string());
		}
		names.sort();

		let mut props = Vec::with_capacity(names.len());
		for name in names {
			if let Some(r) = with_cancel(cancel, self.read_record(&name)).await? {
				props.push(SecretProperties {
					name: name.into(),
					version: r.version,
					updated_at: Timestamp(r.updated_at),
				});
			}
		}
		Ok(props)
	}
}


// vim: ts=4
