/// All database primary keys are PostgreSQL BIGSERIAL.
///
/// `outbox_event.id` doubles as the cursor ordering key: BIGSERIAL is
/// globally unique within the table and monotonically comparable.
pub type DbId = i64;

/// Tenant identifier. Every store query and broadcast is scoped by it.
pub type OrgId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
