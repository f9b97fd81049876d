//! Bracket module: the single-elimination tree.
//!
//! This module provides:
//! - Match, node and bracket data models
//! - The bracket builder mapping an ordered team list to a tree of matches
//! - Winner derivation shared by the builder and the result processor
//!
//! ## Example
//!
//! ```
//! use cup_bracket::bracket::{build, BracketConfig, MatchStatus};
//!
//! let bracket = build(&[1, 2, 3, 4, 5], &BracketConfig::default());
//! assert_eq!(bracket.bracket_size, 8);
//!
//! // Team 5 drew a bye and is already through
//! let bye = &bracket.nodes[2];
//! assert_eq!(bye.status, MatchStatus::Finished);
//! assert_eq!(bye.winner, Some(5));
//! ```

pub mod builder;
pub mod models;

pub use builder::{BracketConfig, bracket_size, build};
pub use models::{
    Bracket, Match, MatchId, MatchNode, MatchStatus, ParseStatusError, TeamNumber, decide_winner,
};
