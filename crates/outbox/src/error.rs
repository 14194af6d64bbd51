//! Error types for the outbox subsystem.

/// Failure of a single broadcast attempt.
///
/// These are transient delivery failures: the processor records them
/// per event and retries on the next invocation rather than aborting.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// The underlying transport failed (network, DNS, timeout).
    #[error("broadcast transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote endpoint returned a non-2xx status.
    #[error("broadcast endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The delivery channel is no longer accepting events.
    #[error("delivery channel closed")]
    Closed,
}

/// Invocation-level failure of a processor or maintenance job.
///
/// Store-level failures abort the whole invocation; because the cursor
/// only advances after per-event commit, events are at worst
/// reprocessed, never lost.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
