//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, graceful shutdown)
//!     → request.rs (request ID generation and propagation)
//!     → handlers.rs (productId validation, pipeline call)
//!     → response.rs (DTO mapping, stable error bodies)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuid, X_REQUEST_ID};
pub use response::{ApiError, ProductDto};
pub use server::{AppState, HttpServer};
