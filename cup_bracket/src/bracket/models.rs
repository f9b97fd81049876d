//! Match and bracket data models.

use super::builder::BYE_SCORE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Team number, unique and assigned sequentially at registration
pub type TeamNumber = i64;

/// Match ID type
pub type MatchId = i64;

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Scheduled, not started
    Upcoming,
    /// Being played right now
    Live,
    /// Result recorded
    Finished,
}

impl MatchStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of `upcoming`, `live`, `finished`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown match status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for MatchStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(MatchStatus::Upcoming),
            "live" => Ok(MatchStatus::Live),
            "finished" => Ok(MatchStatus::Finished),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Derive the winner of a match from its slots, scores and status.
///
/// Only a finished match with unequal scores has a winner, and the winner is
/// whichever slot holds the higher score. An empty slot can never win.
pub fn decide_winner(
    status: MatchStatus,
    score1: u32,
    score2: u32,
    team1: Option<TeamNumber>,
    team2: Option<TeamNumber>,
) -> Option<TeamNumber> {
    if status != MatchStatus::Finished {
        return None;
    }

    match score1.cmp(&score2) {
        std::cmp::Ordering::Greater => team1,
        std::cmp::Ordering::Less => team2,
        std::cmp::Ordering::Equal => None,
    }
}

/// Scores for a match holding exactly one team, which wins by default
fn walkover_scores(team1: Option<TeamNumber>, team2: Option<TeamNumber>) -> Option<(u32, u32)> {
    match (team1, team2) {
        (Some(_), None) => Some((BYE_SCORE, 0)),
        (None, Some(_)) => Some((0, BYE_SCORE)),
        _ => None,
    }
}

/// A persisted match, one node of the elimination tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match ID (not stable across bracket rebuilds)
    pub id: MatchId,
    /// Round number, 1 is the first round
    pub round_number: u32,
    /// Human round name, e.g. "Semifinal 1"
    pub label: String,
    /// Court name
    pub court: String,
    /// Scheduled start
    pub start_time: DateTime<Utc>,
    /// First slot
    pub team1: Option<TeamNumber>,
    /// Second slot
    pub team2: Option<TeamNumber>,
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
    /// Derived from scores and status, see [`decide_winner`]
    pub winner: Option<TeamNumber>,
    /// Downstream match receiving the winner (None for the final)
    pub next_match: Option<MatchId>,
}

impl Match {
    /// Recompute `winner` from the current slots, scores and status
    pub fn refresh_winner(&mut self) {
        self.winner = decide_winner(
            self.status,
            self.score1,
            self.score2,
            self.team1,
            self.team2,
        );
    }

    /// Whether the match is the final
    pub fn is_final(&self) -> bool {
        self.next_match.is_none()
    }

    /// Whether the team occupies either slot
    pub fn has_team(&self, team: TeamNumber) -> bool {
        self.team1 == Some(team) || self.team2 == Some(team)
    }

    /// Whether both slots were filled by real teams (not a bye)
    pub fn is_contested(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }

    /// Put a team into the first empty slot.
    ///
    /// Returns `false` without touching the match when the team is already
    /// placed here or both slots are taken.
    pub fn place_team(&mut self, team: TeamNumber) -> bool {
        place_in_slots(&mut self.team1, &mut self.team2, team)
    }

    /// Finish the match in favour of its only team.
    ///
    /// Returns `false` without touching the match unless exactly one slot is
    /// filled.
    pub fn award_walkover(&mut self) -> bool {
        let Some((score1, score2)) = walkover_scores(self.team1, self.team2) else {
            return false;
        };
        self.score1 = score1;
        self.score2 = score2;
        self.status = MatchStatus::Finished;
        self.refresh_winner();
        true
    }
}

/// A match produced by the bracket builder, before it has an ID.
///
/// Nodes live in an arena ([`Bracket::nodes`]); `next` is an index into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchNode {
    pub round_number: u32,
    pub label: String,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub team1: Option<TeamNumber>,
    pub team2: Option<TeamNumber>,
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
    pub winner: Option<TeamNumber>,
    /// Arena index of the downstream node
    pub next: Option<usize>,
}

impl MatchNode {
    /// Materialize the node as a match with the given IDs
    pub fn to_match(&self, id: MatchId, next_match: Option<MatchId>) -> Match {
        Match {
            id,
            round_number: self.round_number,
            label: self.label.clone(),
            court: self.court.clone(),
            start_time: self.start_time,
            team1: self.team1,
            team2: self.team2,
            score1: self.score1,
            score2: self.score2,
            status: self.status,
            winner: self.winner,
            next_match,
        }
    }

    /// Put a team into the first empty slot, see [`Match::place_team`]
    pub fn place_team(&mut self, team: TeamNumber) -> bool {
        place_in_slots(&mut self.team1, &mut self.team2, team)
    }

    /// See [`Match::award_walkover`]
    pub fn award_walkover(&mut self) -> bool {
        let Some((score1, score2)) = walkover_scores(self.team1, self.team2) else {
            return false;
        };
        self.score1 = score1;
        self.score2 = score2;
        self.status = MatchStatus::Finished;
        self.winner = decide_winner(self.status, score1, score2, self.team1, self.team2);
        true
    }
}

// slot1 is always checked before slot2
fn place_in_slots(
    team1: &mut Option<TeamNumber>,
    team2: &mut Option<TeamNumber>,
    team: TeamNumber,
) -> bool {
    if *team1 == Some(team) || *team2 == Some(team) {
        return false;
    }

    if team1.is_none() {
        *team1 = Some(team);
        true
    } else if team2.is_none() {
        *team2 = Some(team);
        true
    } else {
        false
    }
}

/// A complete single-elimination tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Number of leaf slots (a power of two), 0 when no tree was built
    pub bracket_size: usize,
    /// Number of rounds, `log2(bracket_size)`
    pub rounds: u32,
    /// Nodes in creation order, round by round; the final is last
    pub nodes: Vec<MatchNode>,
}

impl Bracket {
    /// Whether the bracket has no matches
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of matches
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes of one round with their arena indices
    pub fn round(&self, round_number: u32) -> impl Iterator<Item = (usize, &MatchNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.round_number == round_number)
    }

    /// Arena index of the final
    pub fn final_index(&self) -> Option<usize> {
        self.nodes.iter().position(|node| node.next.is_none())
    }

    /// Arena indices of the matches feeding `index`
    pub fn feeders(&self, index: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.next == Some(index))
            .map(|(i, _)| i)
            .collect()
    }
}
