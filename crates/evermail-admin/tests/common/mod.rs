//! Secret store test doubles
//!
//! The in-memory adapter covers the healthy store. The doubles below reject,
//! fail, hang or panic on every write so the writer's fault handling can be
//! checked.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use evermail_secret_adapter_memory::SecretAdapterMemory;
use evermail_types::error::{EmResult, Error};
use evermail_types::secret_adapter::{Secret, SecretAdapter, SecretProperties};
use tokio_util::sync::CancellationToken;

/// Initialize tracing output for tests that need it
pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

/// Store whose writes fail with the error produced by `fault`
#[derive(Debug)]
pub struct FailingStore {
	fault: fn() -> Error,
	pub attempts: AtomicUsize,
}

impl FailingStore {
	pub fn new(fault: fn() -> Error) -> Self {
		Self { fault, attempts: AtomicUsize::new(0) }
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl SecretAdapter for FailingStore {
	async fn set_secret(
		&self,
		_name: &str,
		_value: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		Err((self.fault)())
	}

	async fn get_secret(
		&self,
		_name: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		Err((self.fault)())
	}

	async fn list_secrets(
		&self,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		Err((self.fault)())
	}
}

/// Populated store whose caller lacks write permission
///
/// Reads are served from `inner`, writes are rejected with `403 Forbidden`.
#[derive(Debug)]
pub struct ReadOnlyStore {
	pub inner: SecretAdapterMemory,
	pub attempts: AtomicUsize,
}

impl ReadOnlyStore {
	pub fn with_secrets<'a>(secrets: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
		let inner = SecretAdapterMemory::with_secrets(secrets).expect("Failed to create store");
		Self { inner, attempts: AtomicUsize::new(0) }
	}
}

#[async_trait]
impl SecretAdapter for ReadOnlyStore {
	async fn set_secret(
		&self,
		_name: &str,
		_value: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		Err(Error::forbidden("Forbidden"))
	}

	async fn get_secret(
		&self,
		name: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		self.inner.get_secret(name, cancel).await
	}

	async fn list_secrets(
		&self,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		self.inner.list_secrets(cancel).await
	}
}

/// Store that never answers a write and ignores the cancellation token
#[derive(Debug, Default)]
pub struct HangingStore {
	pub attempts: AtomicUsize,
}

#[async_trait]
impl SecretAdapter for HangingStore {
	async fn set_secret(
		&self,
		_name: &str,
		_value: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		std::future::pending().await
	}

	async fn get_secret(
		&self,
		_name: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		std::future::pending().await
	}

	async fn list_secrets(
		&self,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		std::future::pending().await
	}
}

/// Store whose client crashes on write
#[derive(Debug, Default)]
pub struct PanickingStore;

#[async_trait]
impl SecretAdapter for PanickingStore {
	#[allow(clippy::panic)]
	async fn set_secret(
		&self,
		_name: &str,
		_value: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		panic!("secret client exploded")
	}

	async fn get_secret(
		&self,
		_name: &str,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		Ok(None)
	}

	async fn list_secrets(
		&self,
		_cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		Ok(Vec::new())
	}
}

// vim: ts=4
