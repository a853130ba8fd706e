//! Admin operations for system administration of an Evermail deployment

pub mod auth;
pub mod runtime_mode;

mod prelude;

pub use runtime_mode::RuntimeModeWriter;

// vim: ts=4
