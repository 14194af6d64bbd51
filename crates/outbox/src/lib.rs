//! Transactional outbox delivery subsystem.
//!
//! The building blocks, leaves first:
//!
//! - [`TenantLock`] — per-tenant mutual exclusion via a Postgres
//!   advisory lock, so at most one processor works a tenant's queue.
//! - [`RateLimiter`] / [`InMemoryRateLimiter`] — per-tenant sliding
//!   window bounding broadcast throughput.
//! - [`sanitize`] — deny-by-default projection of an outbox event into
//!   the public payload that crosses the trust boundary.
//! - [`Broadcaster`] — publish seam with an in-process channel hub
//!   ([`ChannelBroadcaster`]) and a webhook transport
//!   ([`WebhookBroadcaster`]).
//! - [`OutboxProcessor`] — the batch control loop tying the above
//!   together within a bounded execution window.
//! - [`OutboxPruner`] — storage reclamation for delivered events.
//! - [`DeadLetterMigrator`] — quarantine for events that exhausted
//!   their retry budget.
//!
//! Delivery is at-least-once: subscribers must tolerate duplicates.

pub mod broadcast;
pub mod dead_letter;
pub mod error;
pub mod lock;
pub mod processor;
pub mod prune;
pub mod rate_limit;
pub mod sanitize;

pub use broadcast::{Broadcaster, ChannelBroadcaster, WebhookBroadcaster};
pub use dead_letter::{DeadLetterMigrator, MigrationReport};
pub use error::{BroadcastError, OutboxError};
pub use lock::TenantLock;
pub use processor::{OutboxProcessor, ProcessOutcome, ProcessorConfig};
pub use prune::{OutboxPruner, PruneReport};
pub use rate_limit::{InMemoryRateLimiter, RateLimiter};
pub use sanitize::{sanitize, PublicEvent};
