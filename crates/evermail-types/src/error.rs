//! Error type shared by all Evermail crates

use std::fmt;

pub type EmResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Parse,
	Timeout,
	/// The caller's cancellation token fired before the operation completed
	Cancelled,
	ValidationError(String),
	ConfigError(String),
	Internal(String),

	/// A request to the secret store was rejected or could not be delivered
	/// (authorization, throttling, network, ...). `status` follows HTTP semantics,
	/// `0` means the request never got a response.
	RequestFailed {
		status: u16,
		message: String,
	},

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Shorthand for an authorization failure reported by a secret store
	pub fn forbidden(message: impl Into<String>) -> Self {
		Error::RequestFailed { status: 403, message: message.into() }
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Parse => write!(f, "parse error"),
			Error::Timeout => write!(f, "operation timed out"),
			Error::Cancelled => write!(f, "operation cancelled"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::RequestFailed { status: 0, message } => write!(f, "{}", message),
			Error::RequestFailed { status, message } => {
				write!(f, "{}\nStatus: {}", message, status)
			}
			Error::Io(err) => write!(f, "I/O error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::debug!("serde_json error: {}", err);
		Self::Parse
	}
}

impl From<base64::DecodeError> for Error {
	fn from(err: base64::DecodeError) -> Self {
		tracing::debug!("base64 decode error: {}", err);
		Self::Parse
	}
}


// vim: ts=4
