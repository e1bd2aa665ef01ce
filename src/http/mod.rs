//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (canonicalize method + path)
//!     → routing (RequestMapper against the current RouteSet)
//!     → response.rs (resource or failure page)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, RequestError};
pub use server::{HttpServer, ServeState};
