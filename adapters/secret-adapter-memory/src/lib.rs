//! In-memory secret store. Contents are lost when the process exits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use evermail_types::{
	prelude::*,
	secret_adapter::{
		check_cancelled, validate_secret_name, Secret, SecretAdapter, SecretProperties,
	},
};

#[derive(Debug, Default)]
pub struct SecretAdapterMemory {
	secrets: RwLock<BTreeMap<Box<str>, Secret>>,
}

impl SecretAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store pre-populated with `(name, value)` pairs
	pub fn with_secrets<'a>(
		secrets: impl IntoIterator<Item = (&'a str, &'a str)>,
	) -> EmResult<Self> {
		let store = Self::new();
		for (name, value) in secrets {
			store.put(name, value)?;
		}
		Ok(store)
	}

	/// Current value of a secret, bypassing the async interface
	pub fn value(&self, name: &str) -> Option<Box<str>> {
		self.secrets.read().get(name).map(|s| s.value.clone())
	}

	fn put(&self, name: &str, value: &str) -> EmResult<SecretProperties> {
		validate_secret_name(name)?;

		let mut secrets = self.secrets.write();
		let version = secrets.get(name).map_or(0, |s| s.properties.version) + 1;
		let properties =
			SecretProperties { name: name.into(), version, updated_at: Timestamp::now() };
		secrets.insert(name.into(), Secret { properties: properties.clone(), value: value.into() });
		debug!(secret = %name, version, "secret stored in memory");

		Ok(properties)
	}
}

#[async_trait]
impl SecretAdapter for SecretAdapterMemory {
	async fn set_secret(
		&self,
		name: &str,
		value: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties> {
		check_cancelled(cancel)?;
		self.put(name, value)
	}

	async fn get_secret(
		&self,
		name: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>> {
		check_cancelled(cancel)?;
		validate_secret_name(name)?;
		Ok(self.secrets.read().get(name).cloned())
	}

	async fn list_secrets(
		&self,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>> {
		check_cancelled(cancel)?;
		Ok(self.secrets.read().values().map(|s| s.properties.clone()).collect())
	}
}


// vim: ts=4
