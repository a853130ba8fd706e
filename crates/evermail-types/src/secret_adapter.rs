//! Adapter that stores small named secret values (runtime flags, connection strings, ...).
//!
//! Secret names follow the Key Vault convention: 1-127 characters, ASCII
//! alphanumerics and dashes. A double dash separates configuration sections, so
//! the secret `EvermailRuntime--Mode` surfaces as the `EvermailRuntime:Mode`
//! configuration key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, future::Future};
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
use crate::types::serialize_timestamp_iso;

pub const SECRET_NAME_MAX_LEN: usize = 127;

/// Separator between configuration sections inside a secret name
pub const SECTION_SEPARATOR: &str = "--";

/// Metadata of a stored secret, never includes the value
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretProperties {
	pub name: Box<str>,
	/// Monotonic per-name version, incremented on every write
	pub version: u64,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// A secret value together with its metadata
#[derive(Clone)]
pub struct Secret {
	pub properties: SecretProperties,
	pub value: Box<str>,
}

impl Debug for Secret {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Secret")
			.field("properties", &self.properties)
			.field("value", &format_args!("<{} bytes>", self.value.len()))
			.finish()
	}
}

#[async_trait]
pub trait SecretAdapter: Debug + Send + Sync {
	/// Sets the value of a secret, creating a new version
	///
	/// Implementations must either complete the write or leave the previous value
	/// untouched, also when the returned future is dropped. `Error::Cancelled`
	/// means nothing was committed. A `cancel` that fires after the commit point
	/// may still yield `Ok`.
	async fn set_secret(
		&self,
		name: &str,
		value: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<SecretProperties>;

	/// Reads the current version of a secret
	async fn get_secret(
		&self,
		name: &str,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Option<Secret>>;

	/// Lists the properties of all stored secrets, ordered by name
	async fn list_secrets(
		&self,
		cancel: Option<&CancellationToken>,
	) -> EmResult<Vec<SecretProperties>>;
}

/// Validates a secret name
pub fn validate_secret_name(name: &str) -> EmResult<()> {
	if name.is_empty() || name.len() > SECRET_NAME_MAX_LEN {
		return Err(Error::ValidationError(format!(
			"secret name must be 1-{} characters long",
			SECRET_NAME_MAX_LEN
		)));
	}
	if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
		return Err(Error::ValidationError(format!(
			"secret name '{}' may only contain alphanumerics and dashes",
			name
		)));
	}
	Ok(())
}

/// Fails with `Error::Cancelled` if the token has already fired
pub fn check_cancelled(cancel: Option<&CancellationToken>) -> EmResult<()> {
	match cancel {
		Some(token) if token.is_cancelled() => Err(Error::Cancelled),
		_ => Ok(()),
	}
}

/// Runs `fut` until it completes or `cancel` fires, whichever happens first
pub async fn with_cancel<T, F>(cancel: Option<&CancellationToken>, fut: F) -> EmResult<T>
where
	F: Future<Output = EmResult<T>> + Send,
{
	match cancel {
		Some(token) => token.run_until_cancelled(fut).await.unwrap_or(Err(Error::Cancelled)),
		None => fut.await,
	}
}


// vim: ts=4
