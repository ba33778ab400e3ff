//! Huddle Core - domain model and client-side state
//!
//! This crate holds the pieces of the chat client that everything else leans on:
//! - **Domain** (`domain`) - user profiles, presence statuses, posts
//! - **Store** (`store`) - normalized in-memory cache of user records
//! - **Config** (`config`) - TOML file + `HUDDLE_*` env var configuration
//! - **Telemetry** (`telemetry`) - tracing subscriber setup
//!
//! # Key Types
//!
//! - `UserStore` - lookup-by-id cache that bulk fetch results merge into
//! - `ClientConfig` - server endpoint, batching thresholds, logging
//! - `BatchSettings` - thresholds and intervals for the fetch aggregator

pub mod config;
pub mod domain;
pub mod store;
pub mod telemetry;

pub use config::{
    BatchSettings, ClientConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    LoggingConfig, ServerConfig,
};
pub use domain::{Post, PresenceStatus, UserId, UserProfile, UserStatus};
pub use store::UserStore;
