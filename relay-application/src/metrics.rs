use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    ingest_requests: AtomicU64,
    ingest_rejected: AtomicU64,
    ingest_errors: AtomicU64,
    auth_failures: AtomicU64,
    commands_queued: AtomicU64,
    commands_drained: AtomicU64,
    records_purged: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self) {
        self.ingest_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_rejected(&self) {
        self.ingest_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_queued(&self) {
        self.commands_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commands_drained(&self, count: usize) {
        self.commands_drained
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_purged(&self, count: u64) {
        self.records_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn ingest_requests(&self) -> u64 {
        self.ingest_requests.load(Ordering::Relaxed)
    }

    /// `queue_length` is sampled by the caller from the command queue.
    pub fn render_prometheus(&self, queue_length: usize) -> String {
        let requests = self.ingest_requests.load(Ordering::Relaxed);
        let rejected = self.ingest_rejected.load(Ordering::Relaxed);
        let errors = self.ingest_errors.load(Ordering::Relaxed);
        let auth_failures = self.auth_failures.load(Ordering::Relaxed);
        let queued = self.commands_queued.load(Ordering::Relaxed);
        let drained = self.commands_drained.load(Ordering::Relaxed);
        let purged = self.records_purged.load(Ordering::Relaxed);

        format!(
            "# TYPE scum_relay_ingest_requests_total counter\n\
scum_relay_ingest_requests_total {}\n\
# TYPE scum_relay_ingest_rejected_total counter\n\
scum_relay_ingest_rejected_total {}\n\
# TYPE scum_relay_ingest_errors_total counter\n\
scum_relay_ingest_errors_total {}\n\
# TYPE scum_relay_auth_failures_total counter\n\
scum_relay_auth_failures_total {}\n\
# TYPE scum_relay_commands_queued_total counter\n\
scum_relay_commands_queued_total {}\n\
# TYPE scum_relay_commands_drained_total counter\n\
scum_relay_commands_drained_total {}\n\
# TYPE scum_relay_records_purged_total counter\n\
scum_relay_records_purged_total {}\n\
# TYPE scum_relay_command_queue_length gauge\n\
scum_relay_command_queue_length {}\n",
            requests, rejected, errors, auth_failures, queued, drained, purged, queue_length
        )
    }
}
