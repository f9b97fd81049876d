//! Score snapshot payloads.

use crate::bracket::{Match, MatchId, MatchStatus, TeamNumber};
use crate::db::{MatchRepository, StoreResult, TeamRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder for an unresolved slot
pub const TBD: &str = "TBD";

/// One match as shown to viewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: MatchId,
    /// Team name, or `"TBD"`
    pub team1: String,
    /// Team name, or `"TBD"`
    pub team2: String,
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
}

impl MatchSummary {
    pub fn new(m: &Match, names: &HashMap<TeamNumber, String>) -> Self {
        let name = |slot: Option<TeamNumber>| {
            slot.and_then(|team| names.get(&team).cloned())
                .unwrap_or_else(|| TBD.to_string())
        };

        Self {
            id: m.id,
            team1: name(m.team1),
            team2: name(m.team2),
            score1: m.score1,
            score2: m.score2,
            status: m.status,
        }
    }
}

/// Payload of the push channel and the pull endpoint: `{"matches": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub matches: Vec<MatchSummary>,
}

impl ScoreSnapshot {
    pub fn from_matches(matches: &[Match], names: &HashMap<TeamNumber, String>) -> Self {
        Self {
            matches: matches.iter().map(|m| MatchSummary::new(m, names)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Read a snapshot from the stores, optionally only matches with `status`
pub async fn load_snapshot(
    teams: &dyn TeamRepository,
    matches: &dyn MatchRepository,
    status: Option<MatchStatus>,
) -> StoreResult<ScoreSnapshot> {
    let matches = matches.list_matches(status).await?;
    if matches.is_empty() {
        return Ok(ScoreSnapshot::default());
    }

    let names: HashMap<TeamNumber, String> = teams
        .list_teams()
        .await?
        .into_iter()
        .map(|t| (t.team_number, t.team_name))
        .collect();

    Ok(ScoreSnapshot::from_matches(&matches, &names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unresolved_slots_are_tbd() {
        let m = Match {
            id: 7,
            round_number: 2,
            label: "Final".to_string(),
            court: "Main Court".to_string(),
            start_time: Utc::now(),
            team1: Some(1),
            team2: None,
            score1: 3,
            score2: 0,
            status: MatchStatus::Live,
            winner: None,
            next_match: None,
        };
        let names = HashMap::from([(1, "Spikers".to_string())]);

        let snapshot = ScoreSnapshot::from_matches(&[m], &names);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "matches": [{
                    "id": 7,
                    "team1": "Spikers",
                    "team2": "TBD",
                    "score1": 3,
                    "score2": 0,
                    "status": "live"
                }]
            })
        );
    }
}
