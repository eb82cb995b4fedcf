//! Metric names and descriptions.
//!
//! Every Prometheus metric the daemon emits is named here. Call sites use
//! these constants with `metrics::counter!()`, `metrics::gauge!()` and
//! `metrics::histogram!()`.
//!
//! # Naming
//!
//! - prefix: `docker_hosts_`
//! - suffix: `_total` (counter), `_seconds` (histogram), none (gauge)
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(hostsync_core::metrics::EVENTS_RECEIVED_TOTAL, "action" => "start").increment(1);
//! ```

// ─── label keys ────────────────────────────────────────────────────

/// Event action label key (start, die, connect, disconnect)
pub const LABEL_ACTION: &str = "action";

/// Result label key (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── events ────────────────────────────────────────────────────────

/// Engine events received from the stream (counter, label: action)
pub const EVENTS_RECEIVED_TOTAL: &str = "docker_hosts_events_received_total";

/// Events applied to the host table (counter, label: action)
pub const EVENTS_HANDLED_TOTAL: &str = "docker_hosts_events_handled_total";

/// Events whose handling failed (counter, label: action)
pub const EVENTS_FAILED_TOTAL: &str = "docker_hosts_events_failed_total";

// ─── hosts file ────────────────────────────────────────────────────

/// Hosts file writes (counter, label: result)
pub const HOSTS_WRITES_TOTAL: &str = "docker_hosts_hosts_writes_total";

/// Retried write attempts (counter)
pub const HOSTS_WRITE_RETRIES_TOTAL: &str = "docker_hosts_hosts_write_retries_total";

/// Time to render and write the hosts file (histogram, seconds)
pub const HOSTS_WRITE_DURATION_SECONDS: &str = "docker_hosts_hosts_write_duration_seconds";

// ─── engine ────────────────────────────────────────────────────────

/// Successful (re)connections to the engine (counter)
pub const ENGINE_CONNECTS_TOTAL: &str = "docker_hosts_engine_connects_total";

/// Failed connection attempts (counter)
pub const ENGINE_CONNECT_FAILURES_TOTAL: &str = "docker_hosts_engine_connect_failures_total";

/// Event stream interruptions (counter)
pub const ENGINE_STREAM_INTERRUPTIONS_TOTAL: &str =
    "docker_hosts_engine_stream_interruptions_total";

// ─── host table ────────────────────────────────────────────────────

/// Containers in the host table (gauge)
pub const TABLE_CONTAINERS: &str = "docker_hosts_table_containers";

/// Host records in the host table (gauge)
pub const TABLE_RECORDS: &str = "docker_hosts_table_records";

// ─── daemon ────────────────────────────────────────────────────────

/// Build information (gauge, always 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "docker_hosts_daemon_build_info";

// ─── histogram buckets ─────────────────────────────────────────────

/// Write duration buckets (seconds)
///
/// 100us to 10s; the upper range covers retry waits.
pub const WRITE_DURATION_BUCKETS: [f64; 10] =
    [0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0];

// ─── descriptions ──────────────────────────────────────────────────

/// Registers HELP text for every metric.
///
/// Call once after the global recorder is installed.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        EVENTS_RECEIVED_TOTAL,
        "Container and network events received from the engine"
    );
    describe_counter!(
        EVENTS_HANDLED_TOTAL,
        "Events applied to the host table"
    );
    describe_counter!(
        EVENTS_FAILED_TOTAL,
        "Events whose handling failed and were skipped"
    );

    describe_counter!(HOSTS_WRITES_TOTAL, "Hosts file writes by result");
    describe_counter!(
        HOSTS_WRITE_RETRIES_TOTAL,
        "Hosts file write attempts that were retried"
    );
    describe_histogram!(
        HOSTS_WRITE_DURATION_SECONDS,
        "Time to render and write the hosts file in seconds"
    );

    describe_counter!(
        ENGINE_CONNECTS_TOTAL,
        "Successful connections to the container engine"
    );
    describe_counter!(
        ENGINE_CONNECT_FAILURES_TOTAL,
        "Failed connection attempts to the container engine"
    );
    describe_counter!(
        ENGINE_STREAM_INTERRUPTIONS_TOTAL,
        "Event stream failures that forced a reconnect"
    );

    describe_gauge!(TABLE_CONTAINERS, "Containers currently in the host table");
    describe_gauge!(TABLE_RECORDS, "Host records currently in the host table");

    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
