//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, normalized path, rooted location)
//!     → router.rs (RequestMapper runs the chain)
//!     → matcher.rs (Index → Direct → Routes, first match wins)
//!     → Return: Success(resolved path) or Failure(NotFound)
//!
//! Route Compilation (at session start and on every reload):
//!     routes.json bytes
//!     → route.rs (best-effort parse, patterns compiled)
//!     → Freeze as immutable RouteSet
//!     → Publish through SharedRoutes (atomic pointer swap)
//! ```
//!
//! # Design Decisions
//! - RouteSet is immutable; reloads replace it wholesale
//! - Readers load a snapshot without locking
//! - Deterministic: same input and snapshot always resolve the same way
//! - First match wins (document order, no specificity ranking)

pub mod matcher;
pub mod route;
pub mod router;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use matcher::{MatchOutcome, Matcher, MatcherKind, Resolved};
pub use route::{Route, RouteSet, UnknownVerb, Verb};
pub use router::{RequestMapper, Response, ResponseErrorCode};

/// The currently published RouteSet, shared by request workers and the watcher.
pub type SharedRoutes = Arc<ArcSwap<RouteSet>>;

/// Wrap an initial RouteSet for publication.
pub fn shared_routes(initial: RouteSet) -> SharedRoutes {
    Arc::new(ArcSwap::from_pointee(initial))
}
