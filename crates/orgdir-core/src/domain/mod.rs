//! Domain layer
//!
//! - `organization`: organization directory search

pub mod organization;
