//! Score updates and winner propagation.

use crate::bracket::{Match, MatchStatus};
use crate::tournament::{TournamentError, TournamentResult};
use serde::{Deserialize, Serialize};

/// A validated score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultUpdate {
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
}

impl ResultUpdate {
    /// Validate raw scores from the submission boundary.
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidScore` - a score is negative or does not fit
    ///   the storage column
    pub fn new(score1: i64, score2: i64, status: MatchStatus) -> TournamentResult<Self> {
        Ok(Self {
            score1: checked_score(score1)?,
            score2: checked_score(score2)?,
            status,
        })
    }

    /// Same as [`ResultUpdate::new`] but parses the status string
    pub fn parse(score1: i64, score2: i64, status: &str) -> TournamentResult<Self> {
        let status = status
            .parse::<MatchStatus>()
            .map_err(|e| TournamentError::UnknownStatus(e.0))?;
        Self::new(score1, score2, status)
    }
}

fn checked_score(score: i64) -> TournamentResult<u32> {
    i32::try_from(score)
        .ok()
        .and_then(|s| u32::try_from(s).ok())
        .ok_or(TournamentError::InvalidScore(score))
}

/// Apply a score update to `target` and hand its winner to `next`.
///
/// The winner is recomputed from scratch on every call. When there is a
/// winner and a next match, the winner takes the first empty slot of the next
/// match unless it is already there or both slots are taken.
///
/// Returns `true` when `next` was modified.
pub fn apply_result(target: &mut Match, update: &ResultUpdate, next: Option<&mut Match>) -> bool {
    target.score1 = update.score1;
    target.score2 = update.score2;
    target.status = update.status;
    target.refresh_winner();

    let (Some(winner), Some(next)) = (target.winner, next) else {
        return false;
    };

    if target.next_match != Some(next.id) {
        log::warn!(
            "Match {} was given match {} as next, expected {:?}",
            target.id,
            next.id,
            target.next_match
        );
        return false;
    }

    let placed = next.place_team(winner);
    if placed {
        log::info!(
            "Team {} advances from match {} to match {}",
            winner,
            target.id,
            next.id
        );
    }
    placed
}
