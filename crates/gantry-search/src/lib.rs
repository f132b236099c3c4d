//! Deadline-aware best-first search engines.
//!
//! Two engines share one domain abstraction:
//!
//! - **RBFS** recursive best-first search with linear memory
//!   ([`rbfs::search`])
//! - **HBFS** heap-based best-first search, i.e. A* with open and closed
//!   sets ([`hbfs::search`])
//!
//! Both treat an expired [`Deadline`] as success and return the best
//! partial path they hold, flagged as timed out.
//!
//! # Trait hierarchy
//!
//! | Trait | Required for |
//! |---|---|
//! | [`Domain`] | RBFS |
//! | [`Keyed`] : [`Domain`] | HBFS |
//! | [`Objective`] | both |

mod deadline;
pub mod hbfs;
mod path;
mod queue;
pub mod rbfs;
mod traits;

pub use deadline::Deadline;
pub use hbfs::{HbfsConfig, HbfsOutcome};
pub use path::{Path, Step};
pub use rbfs::{Backup, RbfsConfig, RbfsOutcome};
pub use traits::{Cost, Domain, Keyed, Objective, UNBOUNDED};
