//! Structured logging field names shared by every contentai crate.
//!
//! Use these constants (or the identical literal keys in `tracing` macros)
//! so that log aggregation can filter on the same field across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Handler-level failure, the caller receives a 5xx |
//! | WARN  | Per-record failure isolated inside a task, task still completes |
//! | INFO  | Startup, task lifecycle transitions, embedding generations |
//! | DEBUG | Fetch sizes, prompt sizes, configuration choices |
//! | TRACE | Per-chunk and per-record iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of the inbound HTTP request (UUIDv7).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "tasks"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "dispatcher", "embedding_generator", "openai", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "dispatch", "generate", "embed", "complete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Task UUID being processed.
pub const TASK_ID: &str = "task_id";

/// Task type enum variant.
pub const TASK_TYPE: &str = "task_type";

/// Task status after a transition.
pub const TASK_STATUS: &str = "status";

/// Identifier of a content record.
pub const RECORD_ID: &str = "record_id";

/// Content table a record was read from.
pub const TABLE: &str = "table";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks produced for one record.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Number of records fetched for an operation.
pub const RECORD_COUNT: &str = "record_count";

/// Character length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Character length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
