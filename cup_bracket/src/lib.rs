//! # Cup Bracket
//!
//! Engine for a single-elimination cup: team registration, bracket
//! generation, match result propagation and a live score feed.
//!
//! ## Architecture
//!
//! Every mutation goes through [`tournament::TournamentManager`]:
//!
//! - A registration is validated, stored under the next team number, and the
//!   whole bracket is regenerated from the teams in registration order.
//! - A score update recomputes the match winner and hands it to the next
//!   match; both rows are saved together.
//! - After each save a state-change event reaches the [`feed`] publisher,
//!   which pushes the live matches to every subscribed viewer.
//!
//! ## Core Modules
//!
//! - [`bracket`]: match models and the bracket builder
//! - [`results`]: score updates and winner propagation
//! - [`registration`]: team/player models and submission validation
//! - [`db`]: PostgreSQL and in-memory stores
//! - [`feed`]: live snapshot fan-out
//! - [`tournament`]: the manager tying it together
//!
//! ## Example
//!
//! ```
//! use cup_bracket::{build, BracketConfig};
//!
//! let bracket = build(&[1, 2, 3, 4, 5, 6], &BracketConfig::default());
//! assert_eq!(bracket.bracket_size, 8);
//! assert_eq!(bracket.nodes.last().map(|m| m.label.as_str()), Some("Final"));
//! ```

/// Match models and the bracket builder.
pub mod bracket;
pub use bracket::{Bracket, BracketConfig, Match, MatchId, MatchStatus, TeamNumber, build};

/// Database stores.
pub mod db;

/// Live score feed.
pub mod feed;

/// Registration intake.
pub mod registration;

/// Result processing.
pub mod results;

/// Tournament manager.
pub mod tournament;
pub use tournament::{TournamentConfig, TournamentError, TournamentManager, TournamentResult};
