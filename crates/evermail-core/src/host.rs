//! Hosting environment detection

use std::{fmt, str::FromStr};

use crate::prelude::*;

/// Variable selecting the hosting environment
pub const ENVIRONMENT_VAR: &str = "EVERMAIL_ENVIRONMENT";
/// Set by the hosting platform on every instance of a deployed app
pub const HOSTED_INSTANCE_VAR: &str = "WEBSITE_INSTANCE_ID";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostEnvironment {
	Development,
	Staging,
	#[default]
	Production,
}

impl HostEnvironment {
	pub fn is_development(self) -> bool {
		self == HostEnvironment::Development
	}

	pub fn is_production(self) -> bool {
		self == HostEnvironment::Production
	}

	/// Parses an environment name, unset or unknown names mean production
	pub fn from_name(name: Option<&str>) -> Self {
		match name.map(str::trim) {
			None | Some("") => HostEnvironment::Production,
			Some(name) => name.parse().unwrap_or_else(|()| {
				warn!(environment = %name, "Unknown host environment, assuming Production");
				HostEnvironment::Production
			}),
		}
	}

	pub fn from_process_env() -> Self {
		Self::from_name(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
	}
}

impl FromStr for HostEnvironment {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.eq_ignore_ascii_case("development") {
			Ok(HostEnvironment::Development)
		} else if s.eq_ignore_ascii_case("staging") {
			Ok(HostEnvironment::Staging)
		} else if s.eq_ignore_ascii_case("production") {
			Ok(HostEnvironment::Production)
		} else {
			Err(())
		}
	}
}

impl fmt::Display for HostEnvironment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HostEnvironment::Development => write!(f, "Development"),
			HostEnvironment::Staging => write!(f, "Staging"),
			HostEnvironment::Production => write!(f, "Production"),
		}
	}
}

/// Secret store configuration is loaded in production and on hosted instances
pub fn should_load_secret_store(env: HostEnvironment, hosted: bool) -> bool {
	env.is_production() || hosted
}

/// True when running on a hosted platform instance
pub fn is_hosted_instance() -> bool {
	std::env::var(HOSTED_INSTANCE_VAR).is_ok_and(|v| !v.is_empty())
}


// vim: ts=4
