use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Backend API usage counters
#[derive(Debug, Default)]
pub struct ApiMetrics {
    pub total_requests: AtomicU64,
    pub rate_limit_hits: AtomicU64,
    pub errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        warn!("Backend rate limit hit");
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ApiStats {
        ApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            requests = stats.total_requests,
            rate_limits = stats.rate_limit_hits,
            errors = stats.errors,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            "Backend API metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStats {
    pub total_requests: u64,
    pub rate_limit_hits: u64,
    pub errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Process-wide metrics instance
static API_METRICS: std::sync::LazyLock<ApiMetrics> = std::sync::LazyLock::new(ApiMetrics::new);

pub fn api_metrics() -> &'static ApiMetrics {
    &API_METRICS
}

/// Span for one workflow operation, correlated across its backend calls
pub fn create_workflow_span(workflow: &str, operation: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        workflow.name = workflow,
        workflow.operation = operation,
        correlation.id = correlation_id,
    )
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
