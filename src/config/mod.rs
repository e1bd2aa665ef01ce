//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server settings (TOML, read once at startup)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! routes document (JSON, inside the served folder, live):
//!     watcher.rs detects change
//!     → stable read, RouteSet::parse
//!     → atomic swap of Arc<RouteSet>
//!     → next request observes the new routes
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; routes are the only live config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ReloadConfig;
pub use schema::RoutingConfig;
pub use schema::ServerConfig;
