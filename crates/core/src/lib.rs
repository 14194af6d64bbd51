//! Shared types and the domain error enum for the relay workspace.

pub mod error;
pub mod types;

pub use error::CoreError;
