//! Local static-content server with live, file-based routing.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod resolver;
pub mod routing;
pub mod session;

pub use config::ServerConfig;
pub use resolver::{LocalResolver, MemoryResolver, Resolver};
pub use routing::{RequestMapper, RouteSet};
pub use session::{Session, SessionError, SessionState};
