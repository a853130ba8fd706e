//! Admin access policy
//!
//! Admin operations are limited to an allow-list of email addresses and email
//! domains, configured in the `AdminAuth` section:
//!
//! ```text
//! AdminAuth:AllowedEmails:0 = ops@example.com
//! AdminAuth:AllowedDomains:0 = example.org
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::prelude::*;

pub const ADMIN_AUTH_SECTION: &str = "AdminAuth";
pub const SUPER_ADMIN_ROLE: &str = "SuperAdmin";

/// Claims checked for the user's email, in order
const EMAIL_CLAIMS: [&str; 4] = [
	"http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
	"email",
	"preferred_username",
	"upn",
];

/// `AdminAuth` configuration section
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminAuthOptions {
	#[serde(rename = "allowedemails")]
	pub allowed_emails: Vec<String>,
	#[serde(rename = "alloweddomains")]
	pub allowed_domains: Vec<String>,
}

/// Checks whether `email` may perform admin operations
pub fn is_allowed(email: Option<&str>, opts: &AdminAuthOptions) -> bool {
	let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
		return false;
	};
	let email = email.to_lowercase();

	if opts.allowed_emails.iter().any(|e| e.trim().eq_ignore_ascii_case(&email)) {
		return true;
	}

	let Some(at) = email.rfind('@') else {
		return false;
	};
	if at == 0 || at >= email.len() - 1 {
		return false;
	}

	let domain = &email[at + 1..];
	opts.allowed_domains.iter().any(|d| d.trim().eq_ignore_ascii_case(domain))
}

/// Like [`is_allowed`], but fails with `Error::PermissionDenied`
pub fn require_admin(email: Option<&str>, opts: &AdminAuthOptions) -> EmResult<()> {
	if is_allowed(email, opts) {
		Ok(())
	} else {
		warn!(email = ?email, "Admin permission denied - address not on the allow-list");
		Err(Error::PermissionDenied)
	}
}

/// Extracts the user's email from token claims
pub fn email_from_claims(claims: &Map<String, Value>) -> Option<&str> {
	EMAIL_CLAIMS.iter().find_map(|claim| claims.get(*claim).and_then(Value::as_str))
}


// vim: ts=4
