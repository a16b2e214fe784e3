//! # querykit
//!
//! A type-safe query layer over a relational store. Entities get generated
//! query paths, queries are built from typed expressions and then either
//! translated to PostgreSQL or evaluated by the in-memory engine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use querykit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let querykit = QueryKit::new(AppConfig::in_memory()).await?;
//!
//!     let session = querykit.session().await?;
//!     let mut team = Team::new("teamA");
//!     let member = Member::new(Some("member1"), 10, &mut team);
//!     session.persist(&team).await?;
//!     session.persist(&member).await?;
//!
//!     let m = QMember::default();
//!     let found = session
//!         .query()
//!         .select_from(&m)
//!         .filter(m.name.eq("member1").and(m.age.eq(10)))
//!         .fetch_one()
//!         .await?;
//!     println!("Found member: {:?}", found.name);
//!
//!     session.commit().await?;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod migration;
pub mod model;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::QueryKit;
pub use errors::QueryKitError;
pub use model::{Member, QMember, QTeam, Team};

// Re-export centralized config
pub use config::{AppConfig, BackendKind, DatabaseConfig, QueryConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use entity_derive;
pub use query_core;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
