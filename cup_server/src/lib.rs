//! HTTP and WebSocket front end for the cup.
//!
//! The binary wires a [`cup_bracket::TournamentManager`] and a live feed into
//! the router built by [`api::create_router`]. Everything is exposed as a
//! library so the integration tests can drive the same router.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
