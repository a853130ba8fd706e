//! Runtime mode resolution
//!
//! The runtime mode decides which backing services a process talks to. Admins
//! change it by writing the `EvermailRuntime--Mode` secret, services pick it up
//! through the secret store configuration layer on their next start.

use serde::Deserialize;
use std::{fmt, str::FromStr};

use crate::config::{Configuration, CONNECTION_STRINGS_SECTION, ENV_SEPARATOR};
use crate::host::HostEnvironment;
use crate::prelude::*;

pub const RUNTIME_SECTION: &str = "EvermailRuntime";
pub const RUNTIME_MODE_KEY: &str = "EvermailRuntime:Mode";
/// Secret holding the runtime mode. Readers depend on this exact name.
pub const RUNTIME_MODE_SECRET: &str = "EvermailRuntime--Mode";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeMode {
	/// Local emulators and development databases
	Local,
	/// Deployed cloud resources
	AzureProd,
}

impl FromStr for RuntimeMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.eq_ignore_ascii_case("local") {
			Ok(RuntimeMode::Local)
		} else if s.eq_ignore_ascii_case("azureprod") {
			Ok(RuntimeMode::AzureProd)
		} else {
			Err(Error::ValidationError(format!("unknown runtime mode '{}'", s)))
		}
	}
}

impl fmt::Display for RuntimeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RuntimeMode::Local => write!(f, "Local"),
			RuntimeMode::AzureProd => write!(f, "AzureProd"),
		}
	}
}

/// `EvermailRuntime` configuration section
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase", default)]
pub struct RuntimeOptions {
	pub mode: String,
}

impl Default for RuntimeOptions {
	fn default() -> Self {
		RuntimeOptions { mode: RuntimeMode::Local.to_string() }
	}
}

/// Resolves the runtime mode from configuration
///
/// Unset, blank or unknown values fall back to `Local` on development machines
/// and to `AzureProd` everywhere else.
pub fn resolve_mode(config: &Configuration, env: HostEnvironment) -> RuntimeMode {
	if let Some(value) = config.get(RUNTIME_MODE_KEY).filter(|v| !v.trim().is_empty()) {
		match value.parse() {
			Ok(mode) => return mode,
			Err(e) => warn!(mode = %value, error = %e, "Ignoring configured runtime mode"),
		}
	}

	if env.is_development() {
		RuntimeMode::Local
	} else {
		RuntimeMode::AzureProd
	}
}

/// Picks the connection string `name` for the given runtime mode
///
/// In `Local` mode the process variable `ConnectionStrings__<name>` wins over
/// configuration, so a secret store holding cloud connection strings can not
/// redirect a local run. Other modes prefer `<name>Azure` and fall back to the
/// plain name.
pub fn resolve_connection_string<F>(
	config: &Configuration,
	mode: RuntimeMode,
	name: &str,
	env_lookup: F,
) -> Option<String>
where
	F: Fn(&str) -> Option<String>,
{
	match mode {
		RuntimeMode::Local => {
			let var = format!("{}{}{}", CONNECTION_STRINGS_SECTION, ENV_SEPARATOR, name);
			env_lookup(&var)
				.filter(|v| !v.trim().is_empty())
				.or_else(|| config.connection_string(name).map(str::to_string))
		}
		RuntimeMode::AzureProd => config
			.connection_string(&format!("{}Azure", name))
			.or_else(|| config.connection_string(name))
			.map(str::to_string),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::secret_name_to_key;

	fn no_env(_: &str) -> Option<String> {
		None
	}

	#[test]
	fn test_parse_mode() {
		assert_eq!("local".parse::<RuntimeMode>().ok(), Some(RuntimeMode::Local));
		assert_eq!(" AZUREPROD ".parse::<RuntimeMode>().ok(), Some(RuntimeMode::AzureProd));
		assert!("Maintenance".parse::<RuntimeMode>().is_err());
		assert_eq!(RuntimeMode::AzureProd.to_string(), "AzureProd");
	}

	#[test]
	fn test_secret_maps_to_mode_key() {
		assert_eq!(secret_name_to_key(RUNTIME_MODE_SECRET), RUNTIME_MODE_KEY);
	}

	#[test]
	fn test_resolve_configured_mode() {
		let mut config = Configuration::new();
		config.set(RUNTIME_MODE_KEY, "azureprod");
		assert_eq!(resolve_mode(&config, HostEnvironment::Development), RuntimeMode::AzureProd);
	}

	#[test]
	fn test_resolve_defaults() {
		let mut config = Configuration::new();
		assert_eq!(resolve_mode(&config, HostEnvironment::Development), RuntimeMode::Local);
		assert_eq!(resolve_mode(&config, HostEnvironment::Production), RuntimeMode::AzureProd);
		assert_eq!(resolve_mode(&config, HostEnvironment::Staging), RuntimeMode::AzureProd);

		config.set(RUNTIME_MODE_KEY, "   ");
		assert_eq!(resolve_mode(&config, HostEnvironment::Development), RuntimeMode::Local);

		config.set(RUNTIME_MODE_KEY, "Maintenance");
		assert_eq!(resolve_mode(&config, HostEnvironment::Production), RuntimeMode::AzureProd);
	}

	#[test]
	fn test_runtime_options_default() {
		let config = Configuration::new();
		let opts: RuntimeOptions = config.bind(RUNTIME_SECTION).unwrap_or_default();
		assert_eq!(opts.mode, "Local");

		let mut config = Configuration::new();
		config.set(RUNTIME_MODE_KEY, "AzureProd");
		let opts: RuntimeOptions = config.bind(RUNTIME_SECTION).unwrap_or_default();
		assert_eq!(opts.mode, "AzureProd");
	}

	#[test]
	fn test_local_prefers_process_env() {
		let mut config = Configuration::new();
		config.set("ConnectionStrings:evermaildb", "Server=vault");
		let env = |var: &str| {
			(var == "ConnectionStrings__evermaildb").then(|| "Server=localhost".to_string())
		};
		assert_eq!(
			resolve_connection_string(&config, RuntimeMode::Local, "evermaildb", env).as_deref(),
			Some("Server=localhost")
		);
		assert_eq!(
			resolve_connection_string(&config, RuntimeMode::Local, "evermaildb", no_env)
				.as_deref(),
			Some("Server=vault")
		);
	}

	#[test]
	fn test_local_ignores_blank_env() {
		let mut config = Configuration::new();
		config.set("ConnectionStrings:blobs", "UseDevelopmentStorage=true");
		let env = |_: &str| Some("  ".to_string());
		assert_eq!(
			resolve_connection_string(&config, RuntimeMode::Local, "blobs", env).as_deref(),
			Some("UseDevelopmentStorage=true")
		);
	}

	#[test]
	fn test_azure_prefers_azure_key() {
		let mut config = Configuration::new();
		config.set("ConnectionStrings:queues", "legacy");
		assert_eq!(
			resolve_connection_string(&config, RuntimeMode::AzureProd, "queues", no_env)
				.as_deref(),
			Some("legacy")
		);
		config.set("ConnectionStrings:queuesAzure", "cloud");
		assert_eq!(
			resolve_connection_string(&config, RuntimeMode::AzureProd, "queues", no_env)
				.as_deref(),
			Some("cloud")
		);
		assert_eq!(resolve_connection_string(&config, RuntimeMode::AzureProd, "x", no_env), None);
	}
}

// vim: ts=4
