//! The tutorial model: members optionally belonging to a team
//!
//! Both entities are declared with `#[model]`, which also generates their
//! query paths `QMember` and `QTeam`.

pub mod member;
pub mod team;

pub use member::{Member, QMember};
pub use team::{QTeam, Team};
