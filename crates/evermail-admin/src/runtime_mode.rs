//! Runtime mode switching
//!
//! Writes the requested mode into the secret store under
//! [`RUNTIME_MODE_SECRET`]. Services read it back through their configuration
//! on the next start. Store failures never escape: every call returns an
//! [`OperationOutcome`].

use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
pub use evermail_core::runtime::RUNTIME_MODE_SECRET;
use evermail_types::outcome::OperationOutcome;
use evermail_types::secret_adapter::{with_cancel, SecretAdapter};

const EMPTY_FAULT_MESSAGE: &str = "secret store request failed";

#[derive(Debug, Clone)]
pub struct RuntimeModeWriter {
	store: Arc<dyn SecretAdapter>,
}

impl RuntimeModeWriter {
	pub fn new(store: Arc<dyn SecretAdapter>) -> Self {
		Self { store }
	}

	/// Stores `mode` verbatim under the runtime mode secret.
	///
	/// Exactly one write is attempted, failures are not retried. A cancelled
	/// call reports `Failed("operation cancelled")`.
	pub async fn set_runtime_mode(
		&self,
		mode: &str,
		cancel: Option<&CancellationToken>,
	) -> OperationOutcome {
		let write = with_cancel(cancel, self.store.set_secret(RUNTIME_MODE_SECRET, mode, cancel));

		match AssertUnwindSafe(write).catch_unwind().await {
			Ok(Ok(props)) => {
				info!(
					secret = RUNTIME_MODE_SECRET,
					version = props.version,
					mode_len = mode.len(),
					"Runtime mode updated"
				);
				OperationOutcome::Succeeded
			}
			// Store rejections (RequestFailed) and every other fault end up here alike
			Ok(Err(err)) => {
				warn!(secret = RUNTIME_MODE_SECRET, error = %err, "Failed to set runtime mode");
				OperationOutcome::failed(fault_message(&err.to_string()))
			}
			Err(panic) => {
				let msg = panic
					.downcast_ref::<&str>()
					.map(ToString::to_string)
					.or_else(|| panic.downcast_ref::<String>().cloned())
					.unwrap_or_default();
				error!(secret = RUNTIME_MODE_SECRET, panic = %msg, "Secret store client panicked");
				OperationOutcome::failed(fault_message(&msg))
			}
		}
	}
}

fn fault_message(msg: &str) -> String {
	if msg.trim().is_empty() {
		EMPTY_FAULT_MESSAGE.to_string()
	} else {
		msg.to_string()
	}
}


// vim: ts=4
