//! Core types and trait definitions for the Stance profile service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, identity, and API crates all depend on it.

pub mod error;
pub mod identity;
pub mod profile;
pub mod store;

pub use error::{Error, Result};
