//! Common types

use serde::{Deserialize, Serialize, Serializer};
use std::{
	fmt,
	time::{SystemTime, UNIX_EPOCH},
};

/// Unix timestamp in seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let secs = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or_default();
		Timestamp(i64::try_from(secs).unwrap_or(i64::MAX))
	}

	/// RFC 3339 representation, falls back to the raw number for out of range values
	pub fn to_iso_string(&self) -> String {
		chrono::DateTime::from_timestamp(self.0, 0)
			.map_or_else(|| self.0.to_string(), |dt| dt.to_rfc3339())
	}
}

impl fmt::Display for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

pub fn serialize_timestamp_iso<S>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	s.serialize_str(&ts.to_iso_string())
}


// vim: ts=4
