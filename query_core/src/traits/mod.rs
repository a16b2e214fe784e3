//! Trait definitions
//!
//! Entities and their query paths on one side, storage backends on the other.

pub mod backend;
pub mod entity;

pub use backend::{Backend, UnitOfWork};
pub use entity::{Entity, EntityPath};
