//! # conduit-std
//!
//! Standard implementations for the Conduit step-chaining library.
//!
//! This crate provides:
//! - **Standard steps**: logging, taps and deferral ([`steps`])
//! - **Testing utilities**: [`testing::CallLog`], [`testing::Parking`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use conduit_core;

// Modules
pub mod steps;
pub mod testing;
