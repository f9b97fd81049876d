//! Result processing: score updates, winner derivation and advancement.
//!
//! The functions here are pure; persistence, locking and the live feed
//! notification are handled by [`crate::tournament::TournamentManager`].

pub mod processor;

pub use processor::{ResultUpdate, apply_result};
