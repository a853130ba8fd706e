//! Result shape reported by admin operations that never propagate errors

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Outcome of an admin operation.
///
/// Serializes as `{"success": true}` or `{"success": false, "error": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(into = "OutcomeRepr", try_from = "OutcomeRepr")]
pub enum OperationOutcome {
	Succeeded,
	Failed(Box<str>),
}

impl OperationOutcome {
	pub fn failed(message: impl Into<Box<str>>) -> Self {
		OperationOutcome::Failed(message.into())
	}

	pub fn success(&self) -> bool {
		matches!(self, OperationOutcome::Succeeded)
	}

	/// Failure description, present if and only if the operation failed
	pub fn error(&self) -> Option<&str> {
		match self {
			OperationOutcome::Succeeded => None,
			OperationOutcome::Failed(msg) => Some(msg),
		}
	}

	/// Tuple view: `(success, error)`
	pub fn into_parts(self) -> (bool, Option<Box<str>>) {
		match self {
			OperationOutcome::Succeeded => (true, None),
			OperationOutcome::Failed(msg) => (false, Some(msg)),
		}
	}
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize)]
struct OutcomeRepr {
	success: bool,
	error: Option<Box<str>>,
}

impl From<OperationOutcome> for OutcomeRepr {
	fn from(outcome: OperationOutcome) -> Self {
		let (success, error) = outcome.into_parts();
		OutcomeRepr { success, error }
	}
}

impl TryFrom<OutcomeRepr> for OperationOutcome {
	type Error = &'static str;

	fn try_from(repr: OutcomeRepr) -> Result<Self, Self::Error> {
		match (repr.success, repr.error) {
			(true, None) => Ok(OperationOutcome::Succeeded),
			(false, Some(msg)) => Ok(OperationOutcome::Failed(msg)),
			(true, Some(_)) => Err("successful outcome must not carry an error"),
			(false, None) => Err("failed outcome must carry an error"),
		}
	}
}


// vim: ts=4
