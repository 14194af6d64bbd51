//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a [`CancellationToken`]
//! for graceful shutdown. The HTTP triggers remain authoritative; these
//! loops just invoke the same idempotent jobs on a fixed cadence.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod maintenance;
