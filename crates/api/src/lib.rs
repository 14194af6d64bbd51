//! HTTP trigger surface for the outbox delivery subsystem.
//!
//! An external scheduler invokes the processor and maintenance jobs
//! through authenticated internal endpoints; all cross-invocation state
//! lives in the database, never in this process.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
