/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Groups are identified by an opaque string uuid assigned by the identity layer.
pub type GroupUuid = String;
