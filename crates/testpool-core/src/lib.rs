//! # testpool-core
//!
//! Core crate for the test data portal. Contains the configuration schemas
//! and the unified error system shared by the store, the HTTP API and the CLI.
//!
//! This crate has **no** internal dependencies on other testpool crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
