//! Request handlers for the internal trigger endpoints.

pub mod outbox;
