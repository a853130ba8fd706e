//! Shared types, adapter traits, and core utilities for Evermail.
//!
//! This crate contains the foundational types that are shared between the
//! feature crates and all secret store adapter implementations.

#![forbid(unsafe_code)]

pub mod error;
pub mod outcome;
pub mod prelude;
pub mod secret_adapter;
pub mod types;

// vim: ts=4
