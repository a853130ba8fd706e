//! Offline BYOK master key material
//!
//! The master key encrypts tenant key material at rest. It is configured once
//! per process as base64 under `OfflineByok:MasterKey` and never changes while
//! the process runs.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::fmt;

use crate::prelude::*;

pub const OFFLINE_BYOK_SECTION: &str = "OfflineByok";
/// 256 bit key
pub const MASTER_KEY_LEN: usize = 32;

/// `OfflineByok` configuration section
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OfflineByokOptions {
	/// Base64-encoded 256-bit master key
	#[serde(rename = "masterkey")]
	pub master_key: Option<String>,
}

impl fmt::Debug for OfflineByokOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OfflineByokOptions")
			.field("master_key", &self.master_key.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Decoded and validated master key
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
	pub fn from_options(opts: &OfflineByokOptions) -> EmResult<Self> {
		let encoded = opts.master_key.as_deref().map(str::trim).unwrap_or_default();
		if encoded.is_empty() {
			return Err(Error::ConfigError(format!(
				"Offline BYOK master key is not configured. Set configuration value '{}:MasterKey' to a base64-encoded 256-bit key.",
				OFFLINE_BYOK_SECTION
			)));
		}

		let decoded = STANDARD.decode(encoded).map_err(|_| {
			Error::ConfigError("Offline BYOK master key must be base64 encoded.".into())
		})?;
		let key: [u8; MASTER_KEY_LEN] = decoded.try_into().map_err(|_| {
			Error::ConfigError("Offline BYOK master key must be 256 bits (32 bytes).".into())
		})?;

		Ok(MasterKey(key))
	}

	pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
		&self.0
	}
}

impl fmt::Debug for MasterKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "MasterKey(<{} bytes>)", MASTER_KEY_LEN)
	}
}


// vim: ts=4
