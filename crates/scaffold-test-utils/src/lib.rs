//! Helpers for end-to-end tests of the `scaffold` binary.

pub mod sandbox;
pub mod snapdir;
