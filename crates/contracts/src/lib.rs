//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Stream Model
//! - A [`Sample`] is one complex baseband value (`Complex32`)
//! - Each processing step sees a [`Window`] whose leading `history` samples
//!   overlap the previous step
//! - Positions returned by a [`SyncSearch`] are offsets into the window's
//!   current (non-history) region

mod capability;
mod error;
mod geometry;
mod sync;
mod tracker_config;

pub use capability::*;
pub use error::*;
pub use geometry::*;
pub use sync::*;
pub use tracker_config::*;
