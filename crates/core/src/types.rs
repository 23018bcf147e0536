/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Verified identity of the user driving a pipeline operation.
///
/// Supplied by the auth layer; the pipeline trusts it opaquely.
pub type CallerId = DbId;
