/// Identifier assigned to each configured probe target.
pub type TargetId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
