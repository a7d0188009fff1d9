//! Integration test crate for the Bazaar marketplace.
//!
//! This crate exists solely to run tests that drive the marketplace client
//! against the emulated ledger. It has no public API; everything lives in
//! the test modules.

#![forbid(unsafe_code)]
