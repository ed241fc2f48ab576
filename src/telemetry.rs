//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder; without one, every
//! metric call is a no-op.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `satchel_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `method`: HTTP method of the request (e.g. "GET", "PATCH")
//! - `status`: outcome: HTTP status code for requests, "ok" / "error"
//!   for refresh cycles, "ok" / "error" / "skipped" / "dropped" for preloads
//! - `pattern`: invalidation pattern name ("user", "auth", "tests", "all")

/// Total network requests issued (retries after a refresh included).
///
/// Labels: `method`, `status`.
pub const REQUESTS_TOTAL: &str = "satchel_requests_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "satchel_cache_hits_total";

/// Total response cache misses (absent or expired).
pub const CACHE_MISSES_TOTAL: &str = "satchel_cache_misses_total";

/// Total pattern invalidations.
///
/// Labels: `pattern`.
pub const CACHE_INVALIDATIONS_TOTAL: &str = "satchel_cache_invalidations_total";

/// Total refresh network calls.
///
/// Labels: `status` ("ok" | "error").
pub const REFRESH_TOTAL: &str = "satchel_refresh_total";

/// Total callers that joined an in-flight refresh instead of starting one.
pub const REFRESH_WAITERS_TOTAL: &str = "satchel_refresh_waiters_total";

/// Total preload tasks by outcome.
///
/// Labels: `status` ("ok" | "error" | "skipped" | "dropped").
pub const PRELOAD_TOTAL: &str = "satchel_preload_total";
