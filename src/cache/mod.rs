//! Result caching subsystem.
//!
//! # Data Flow
//! ```text
//! AggregationPipeline
//!     → store.rs (ResultCache port; TtlCache in-memory implementation)
//!     → events.rs (created / expired / removed / evicted / cleared events)
//!     → sweeper.rs (periodic purge of expired entries until shutdown)
//! ```
//!
//! # Design Decisions
//! - Expiry is time-based; the entry bound is an operational guard only
//! - A write replaces the whole value of one key, never part of it
//! - Expired entries are invisible to readers even before the sweep runs

pub mod events;
pub mod store;
pub mod sweeper;

pub use events::{CacheEvent, CacheEventListener, CacheEventLogger};
pub use store::{CacheError, ResultCache, TtlCache};
pub use sweeper::run_sweeper;
