//! Marigold Core - Shared types library.
//!
//! This crate provides common types used across all Marigold components:
//! - `checkout` - Cart and checkout engine
//! - `cli` - Command-line demo and pricing tools
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
