//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Every query binds
//! `organization_id` explicitly where a tenant is in play, even when
//! the caller is already tenant-scoped.

pub mod cursor_repo;
pub mod dead_letter_repo;
pub mod outbox_repo;

pub use cursor_repo::CursorRepo;
pub use dead_letter_repo::DeadLetterRepo;
pub use outbox_repo::OutboxRepo;
