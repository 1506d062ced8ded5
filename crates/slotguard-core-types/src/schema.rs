//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Comparison identifiers
pub const FIELD_UNIT: &str = "unit";

// Collection sizes
pub const FIELD_OLD_LEN: &str = "old_len";
pub const FIELD_NEW_LEN: &str = "new_len";
pub const FIELD_FINDING_COUNT: &str = "finding_count";
pub const FIELD_UNSAFE_COUNT: &str = "unsafe_count";

// Outcome
pub const FIELD_OK: &str = "ok";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
