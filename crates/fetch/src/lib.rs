//! Huddle Fetch - batched profile/status loading
//!
//! Posts arrive faster than the client can afford per-author lookups, so
//! author ids are coalesced into periodic bulk requests instead:
//!
//! ```text
//! incoming posts → PostBatchOrchestrator → IdBatcher (profiles)
//!                                        → IdBatcher (statuses)
//!                                              ↓ size threshold / timer tick
//!                                          BulkFetcher → UserStore
//! ```
//!
//! # Key Types
//!
//! - `PostBatchOrchestrator` - inspects incoming posts and queues author ids
//! - `IdBatcher` - per-kind pending set with size- and time-based flushing
//! - `BulkFetcher` - trait over the bulk REST endpoints (`RestBulkFetcher`)
//! - `FlushObserver` - injectable instrumentation hook for flush activity

pub mod batcher;
pub mod client;
pub mod observe;
pub mod orchestrator;

pub use batcher::{BatchKind, IdBatcher};
pub use client::{BulkFetcher, FetchError, NoopBulkFetcher, RestBulkFetcher};
pub use observe::{FlushObserver, NoopFlushObserver};
pub use orchestrator::PostBatchOrchestrator;
