//! Integration tests for Marigold.
//!
//! The engine's HTTP path is exercised against an in-process mock commerce
//! gateway (see [`mock_gateway`]): a real `axum` server bound to an
//! ephemeral port, implementing the cart, address, payment, and order
//! endpoints the engine consumes. Tests can reach into the mock's state to
//! seed data and to inject failures.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marigold-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod mock_gateway;
