pub const DEFAULT_INDEX_NAME: &str = "keras";
pub const DEFAULT_BUFFER_CAPACITY: usize = 1;

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const EVENT_FIELD: &str = "event";
pub const RUN_NAME_FIELD: &str = "run_name";
pub const EPOCH_FIELD: &str = "epoch";
pub const DURATION_FIELD: &str = "duration";
