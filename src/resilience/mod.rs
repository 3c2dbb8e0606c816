//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded upstream call:
//!     → registry.rs (pick the breaker of the call class)
//!     → circuit_breaker.rs (permit or short-circuit, record outcome)
//!     → caller matches BreakerFailure to decide abort vs. drop-and-continue
//! ```
//!
//! # Design Decisions
//! - Fallbacks are values (`BreakerFailure`), not callbacks
//! - Timeouts live in the upstream transport, not here
//! - No automatic retries; a later request retries once the breaker recovers

pub mod circuit_breaker;
pub mod registry;

pub use circuit_breaker::{BreakerFailure, BreakerSnapshot, CallPermit, CircuitBreaker, CircuitState};
pub use registry::{BreakerRegistry, CallClass};
