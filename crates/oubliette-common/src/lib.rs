//! # Oubliette Common
//!
//! Common types and shared abstractions for the Oubliette behavioral core.
//!
//! This crate provides foundational types used across all subsystems:
//! - ID types (EntityId, RoomId)
//! - 2D vector math
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use prelude::*;
