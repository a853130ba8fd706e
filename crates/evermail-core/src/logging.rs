//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::prelude::*;

/// Installs the global fmt subscriber, filtered by `RUST_LOG`
pub fn init_tracing() -> EmResult<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_target(false)
		.try_init()
		.map_err(|e| Error::Internal(format!("failed to install tracing subscriber: {}", e)))
}

// vim: ts=4
