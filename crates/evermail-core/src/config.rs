//! Layered configuration
//!
//! Flat, case-insensitive key/value map where `:` separates sections
//! (`EvermailRuntime:Mode`, `ConnectionStrings:evermaildb`). Sources are applied
//! in order and later sources override earlier ones:
//!
//! 1. defaults set by the service itself
//! 2. environment variables, `__` maps to `:` (`EvermailRuntime__Mode`)
//! 3. secret store contents, `--` maps to `:` (`EvermailRuntime--Mode`)
//!
//! Sections can be bound to typed options structs with [`Configuration::bind`].
//! Binding lowercases every key, so options structs use
//! lowercase serde names (`#[serde(rename = "allowedemails")]`).

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, ffi::OsString};
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
use evermail_types::secret_adapter::{SecretAdapter, SECTION_SEPARATOR};

pub const KEY_DELIMITER: char = ':';
pub const ENV_SEPARATOR: &str = "__";
pub const CONNECTION_STRINGS_SECTION: &str = "ConnectionStrings";

#[derive(Clone, Debug)]
struct Entry {
	key: Box<str>,
	value: Box<str>,
}

#[derive(Clone, Debug, Default)]
pub struct Configuration {
	// keyed by lowercased key, keeps the last spelling seen
	entries: BTreeMap<Box<str>, Entry>,
}

fn normalize(key: &str) -> Box<str> {
	key.to_ascii_lowercase().into()
}

impl Configuration {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sets a value, overriding any previous one
	pub fn set(&mut self, key: impl Into<Box<str>>, value: impl Into<Box<str>>) -> &mut Self {
		let key = key.into();
		self.entries.insert(normalize(&key), Entry { key, value: value.into() });
		self
	}

	/// Sets a value only if the key is not present yet
	pub fn set_default(
		&mut self,
		key: impl Into<Box<str>>,
		value: impl Into<Box<str>>,
	) -> &mut Self {
		let key = key.into();
		self.entries.entry(normalize(&key)).or_insert_with(|| Entry { key, value: value.into() });
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.get(&normalize(key)).map(|e| e.value.as_ref())
	}

	/// `ConnectionStrings:<name>`
	pub fn connection_string(&self, name: &str) -> Option<&str> {
		self.get(&format!("{}{}{}", CONNECTION_STRINGS_SECTION, KEY_DELIMITER, name))
	}

	/// Returns the sub-tree below `prefix`, with keys relative to it
	pub fn section(&self, prefix: &str) -> Configuration {
		let mut lower_prefix = prefix.to_ascii_lowercase();
		lower_prefix.push(KEY_DELIMITER);

		let mut section = Configuration::new();
		for (norm, entry) in &self.entries {
			if norm.starts_with(&lower_prefix) {
				let rel = &entry.key[lower_prefix.len()..];
				section.set(rel, entry.value.clone());
			}
		}
		section
	}

	/// Adds environment variables. With a `prefix` only matching variables are
	/// used and the prefix is stripped.
	pub fn add_env_vars<I, K, V>(&mut self, vars: I, prefix: Option<&str>) -> usize
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Box<str>>,
	{
		let mut count = 0;
		for (name, value) in vars {
			let name = name.as_ref();
			let name = match prefix {
				Some(prefix) => match name.strip_prefix(prefix) {
					Some(rest) if !rest.is_empty() => rest,
					_ => continue,
				},
				None => name,
			};
			self.set(name.replace(ENV_SEPARATOR, ":"), value);
			count += 1;
		}
		count
	}

	/// Adds the variables of the current process
	pub fn add_process_env(&mut self, prefix: Option<&str>) -> usize {
		self.add_os_env_vars(std::env::vars_os(), prefix)
	}

	/// Like [`Configuration::add_env_vars`], skipping names or values that are
	/// not valid UTF-8
	pub fn add_os_env_vars<I>(&mut self, vars: I, prefix: Option<&str>) -> usize
	where
		I: IntoIterator<Item = (OsString, OsString)>,
	{
		let vars = vars.into_iter().filter_map(|(name, value)| {
			match (name.into_string(), value.into_string()) {
				(Ok(name), Ok(value)) => Some((name, value)),
				(name, _) => {
					debug!(name = ?name, "skipping environment variable that is not valid UTF-8");
					None
				}
			}
		});
		self.add_env_vars(vars, prefix)
	}

	/// Adds every secret of a secret store, `--` in secret names maps to `:`
	pub async fn add_secret_store(
		&mut self,
		store: &dyn SecretAdapter,
		cancel: Option<&CancellationToken>,
	) -> EmResult<usize> {
		let mut count = 0;
		for props in store.list_secrets(cancel).await? {
			// Deleted between list and get
			let Some(secret) = store.get_secret(&props.name, cancel).await? else {
				continue;
			};
			self.set(secret_name_to_key(&props.name), secret.value);
			count += 1;
		}
		debug!(count, "loaded configuration from secret store");
		Ok(count)
	}

	/// Deserializes the section below `prefix` into `T`
	///
	/// Keys are lowercased. Children whose keys are all numeric become arrays.
	pub fn bind<T: DeserializeOwned>(&self, prefix: &str) -> EmResult<T> {
		let section = self.section(prefix);
		let mut root = Value::Object(Map::new());
		for (norm, entry) in &section.entries {
			insert_path(&mut root, &norm.split(KEY_DELIMITER).collect::<Vec<_>>(), &entry.value);
		}
		let value = arrayify(root);
		serde_json::from_value(value).map_err(|e| {
			Error::ConfigError(format!("invalid '{}' configuration section: {}", prefix, e))
		})
	}
}

/// Maps a secret name to a configuration key (`A--B` -> `A:B`)
pub fn secret_name_to_key(name: &str) -> String {
	name.replace(SECTION_SEPARATOR, ":")
}

fn insert_path(node: &mut Value, path: &[&str], value: &str) {
	let Some((head, rest)) = path.split_first() else {
		return;
	};
	if !node.is_object() {
		*node = Value::Object(Map::new());
	}
	let Value::Object(map) = node else {
		return;
	};
	if rest.is_empty() {
		// A value never replaces an already populated section
		if !map.get(*head).is_some_and(Value::is_object) {
			map.insert((*head).to_string(), Value::String(value.to_string()));
		}
	} else {
		let child = map.entry((*head).to_string()).or_insert(Value::Null);
		insert_path(child, rest, value);
	}
}

fn arrayify(value: Value) -> Value {
	match value {
		Value::Object(map) => {
			let all_indexed = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
			if all_indexed {
				let mut items: Vec<(usize, Value)> = map
					.into_iter()
					.filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, arrayify(v))))
					.collect();
				items.sort_by_key(|(i, _)| *i);
				Value::Array(items.into_iter().map(|(_, v)| v).collect())
			} else {
				Value::Object(map.into_iter().map(|(k, v)| (k, arrayify(v))).collect())
			}
		}
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Default, Deserialize)]
	#[serde(default)]
	struct SampleOptions {
		name: Option<String>,
		#[serde(rename = "allowedemails")]
		allowed_emails: Vec<String>,
	}

	#[test]
	fn test_get_is_case_insensitive() {
		let mut config = Configuration::new();
		config.set("EvermailRuntime:Mode", "Local");
		assert_eq!(config.get("evermailruntime:mode"), Some("Local"));
		assert_eq!(config.get("EVERMAILRUNTIME:MODE"), Some("Local"));
	}

	#[test]
	fn test_set_default_does_not_override() {
		let mut config = Configuration::new();
		config.set("A:B", "first");
		config.set_default("a:b", "second");
		config.set_default("A:C", "third");
		assert_eq!(config.get("A:B"), Some("first"));
		assert_eq!(config.get("A:C"), Some("third"));
	}

	#[test]
	fn test_env_vars_with_prefix() {
		let mut config = Configuration::new();
		let vars = vec![
			("EVERMAIL_EvermailRuntime__Mode", "AzureProd"),
			("EVERMAIL_", "ignored"),
			("PATH", "/usr/bin"),
		];
		let count = config.add_env_vars(vars, Some("EVERMAIL_"));
		assert_eq!(count, 1);
		assert_eq!(config.get("EvermailRuntime:Mode"), Some("AzureProd"));
		assert_eq!(config.get("PATH"), None);
	}

	#[test]
	fn test_later_layer_wins() {
		let mut config = Configuration::new();
		config.set_default("EvermailRuntime:Mode", "Local");
		config.add_env_vars([("EvermailRuntime__Mode", "AzureProd")], None);
		assert_eq!(config.get("EvermailRuntime:Mode"), Some("AzureProd"));
	}

	#[cfg(unix)]
	#[test]
	fn test_os_env_vars_skip_invalid_utf8() {
		use std::os::unix::ffi::OsStringExt;

		let mut config = Configuration::new();
		let vars = vec![
			(OsString::from("EvermailRuntime__Mode"), OsString::from("AzureProd")),
			(OsString::from("BROKEN_VALUE"), OsString::from_vec(b"f\xffo".to_vec())),
			(OsString::from_vec(b"BROKEN_\xffNAME".to_vec()), OsString::from("x")),
		];
		let count = config.add_os_env_vars(vars, None);
		assert_eq!(count, 1);
		assert_eq!(config.get("EvermailRuntime:Mode"), Some("AzureProd"));
		assert_eq!(config.get("BROKEN_VALUE"), None);
	}

	#[test]
	fn test_process_env_loads() {
		let mut config = Configuration::new();
		// Must not fail whatever the test environment contains
		let count = config.add_process_env(None);
		assert_eq!(count, config.len());
	}

	#[test]
	fn test_section() {
		let mut config = Configuration::new();
		config.set("ConnectionStrings:blobs", "UseDevelopmentStorage=true");
		config.set("ConnectionStrings:queues", "q");
		config.set("ConnectionStringsX:other", "x");
		let section = config.section("connectionstrings");
		assert_eq!(section.len(), 2);
		assert_eq!(section.get("blobs"), Some("UseDevelopmentStorage=true"));
		assert_eq!(config.connection_string("queues"), Some("q"));
	}

	#[test]
	fn test_bind_with_arrays() {
		let mut config = Configuration::new();
		config.set("Sample:Name", "admin");
		config.set("Sample:AllowedEmails:1", "b@example.com");
		config.set("Sample:AllowedEmails:0", "a@example.com");
		let opts: SampleOptions = config.bind("Sample").unwrap_or_default();
		assert_eq!(opts.name.as_deref(), Some("admin"));
		assert_eq!(opts.allowed_emails, vec!["a@example.com", "b@example.com"]);
	}

	#[test]
	fn test_bind_missing_section_uses_defaults() {
		let config = Configuration::new();
		let opts: SampleOptions = config.bind("Sample").unwrap_or_default();
		assert!(opts.name.is_none());
		assert!(opts.allowed_emails.is_empty());
	}

	#[test]
	fn test_bind_type_mismatch() {
		#[derive(Debug, Deserialize)]
		struct Strict {
			#[allow(dead_code)]
			port: u16,
		}
		let mut config = Configuration::new();
		config.set("Server:Port", "8080");
		let res: EmResult<Strict> = config.bind("Server");
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_secret_name_mapping() {
		assert_eq!(secret_name_to_key("EvermailRuntime--Mode"), "EvermailRuntime:Mode");
		assert_eq!(secret_name_to_key("ConnectionStrings--blobs"), "ConnectionStrings:blobs");
	}
}

// vim: ts=4
