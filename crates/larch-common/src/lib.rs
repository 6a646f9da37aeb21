//! LarchDB common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all LarchDB components.

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::IndexConfig;
pub use error::{LarchError, Result};
pub use types::TypeId;
pub use value::Value;
