//! Entity models mapped from database rows.

pub mod dead_letter;
pub mod outbox_event;
pub mod processor_cursor;

pub use dead_letter::DeadLetterEntry;
pub use outbox_event::{CreateOutboxEvent, OutboxEvent};
pub use processor_cursor::ProcessorCursor;
