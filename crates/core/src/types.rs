/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Status lookup IDs are SMALLINT, matching the `production_statuses` seed.
pub type StatusId = i16;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
