//! Core infrastructure shared by Evermail services.
//!
//! Layered configuration (defaults, environment, secret store), hosting
//! environment detection, runtime mode resolution and key material options.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod host;
pub mod logging;
pub mod master_key;
pub mod prelude;
pub mod runtime;

pub use config::Configuration;
pub use host::HostEnvironment;
pub use runtime::{resolve_connection_string, resolve_mode, RuntimeMode, RuntimeOptions};

// vim: ts=4
