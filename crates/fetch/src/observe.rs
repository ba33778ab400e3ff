use crate::batcher::BatchKind;
use crate::client::FetchError;

/// Instrumentation hook for flush activity. Injected so callers can count
/// flushes instead of scraping logs; every method has a no-op default.
pub trait FlushObserver: Send + Sync {
    fn flush_started(&self, _kind: BatchKind, _batch_size: usize) {}

    fn flush_completed(&self, _kind: BatchKind, _records: usize) {}

    fn flush_failed(&self, _kind: BatchKind, _error: &FetchError) {}
}

#[derive(Default)]
pub struct NoopFlushObserver;

impl FlushObserver for NoopFlushObserver {}
