//! Convenience re-exports for common querykit usage
//!
//! This prelude module re-exports the most commonly used items from the querykit
//! crates, making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use querykit::prelude::*;
//!
//! let m = QMember::new("m");
//! let adults = m.age.gte(18).and(m.name.is_not_null());
//! ```

// Core querykit components
pub use crate::core::QueryKit;
pub use crate::errors::QueryKitError;
pub use crate::migration;
pub use crate::model::{Member, QMember, QTeam, Team};

// Re-export centralized config
pub use config::{AppConfig, BackendKind, DatabaseConfig, QueryConfig};

// Query building, sessions and results
pub use query_core::prelude::*;

// Entity declaration
pub use entity_derive::{model, Entity};

// Common external dependencies
pub use sqlx;
pub use tokio;
