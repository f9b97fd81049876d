//! Tournament configuration and operation outcomes.

use crate::bracket::{BracketConfig, Match, MatchStatus, TeamNumber};
use crate::feed::TBD;
use crate::registration::Team;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// When a registration may regenerate the bracket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildPolicy {
    /// Rebuild on every registration, discarding any recorded scores
    #[default]
    Always,
    /// Stop rebuilding once play has begun: a match is live, or finished
    /// between two real teams
    BeforeKickoff,
}

impl fmt::Display for RebuildPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RebuildPolicy::Always => "always",
            RebuildPolicy::BeforeKickoff => "before_kickoff",
        })
    }
}

impl FromStr for RebuildPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(RebuildPolicy::Always),
            "before_kickoff" => Ok(RebuildPolicy::BeforeKickoff),
            other => Err(format!(
                "unknown rebuild policy '{other}', expected 'always' or 'before_kickoff'"
            )),
        }
    }
}

/// Tournament configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub bracket: BracketConfig,
    pub rebuild_policy: RebuildPolicy,
}

/// What a rebuild did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RebuildOutcome {
    /// All matches were replaced by a fresh tree
    Rebuilt { bracket_size: usize, matches: usize },
    /// Fewer than two teams: all matches removed, none created
    Cleared,
    /// Play has started and the policy forbids rebuilding
    Skipped,
}

/// Result of a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub team: Team,
    pub players_saved: usize,
    /// Player entries dropped for missing a name or an identity document
    pub players_dropped: usize,
    pub bracket: RebuildOutcome,
}

/// Result of a score update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultOutcome {
    pub updated: Match,
    /// The downstream match, when the winner was placed into it
    pub next_match: Option<Match>,
    /// Matches beyond `next_match` the winner reached by walkover
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub walkovers: Vec<Match>,
}

/// A match with its team names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub details: Match,
    pub team1_name: String,
    pub team2_name: String,
}

impl ScheduleEntry {
    pub fn new(details: Match, names: &HashMap<TeamNumber, String>) -> Self {
        let name = |slot: Option<TeamNumber>| {
            slot.and_then(|team| names.get(&team).cloned())
                .unwrap_or_else(|| TBD.to_string())
        };

        Self {
            team1_name: name(details.team1),
            team2_name: name(details.team2),
            details,
        }
    }
}

/// Matches of one round, by start time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSchedule {
    pub round_number: u32,
    pub matches: Vec<ScheduleEntry>,
}

/// The schedule page: every round, plus what is live and what is next
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rounds: Vec<RoundSchedule>,
    pub live: Vec<ScheduleEntry>,
    pub upcoming: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Group matches by round and order each group by start time
    pub fn from_matches(matches: Vec<Match>, names: &HashMap<TeamNumber, String>) -> Self {
        let mut by_round: BTreeMap<u32, Vec<ScheduleEntry>> = BTreeMap::new();
        let mut live = Vec::new();
        let mut upcoming = Vec::new();

        for m in matches {
            let entry = ScheduleEntry::new(m, names);
            match entry.details.status {
                MatchStatus::Live => live.push(entry.clone()),
                MatchStatus::Upcoming => upcoming.push(entry.clone()),
                MatchStatus::Finished => {}
            }
            by_round
                .entry(entry.details.round_number)
                .or_default()
                .push(entry);
        }

        let by_start = |a: &ScheduleEntry, b: &ScheduleEntry| {
            (a.details.start_time, a.details.id).cmp(&(b.details.start_time, b.details.id))
        };
        live.sort_by(by_start);
        upcoming.sort_by(by_start);

        let rounds = by_round
            .into_iter()
            .map(|(round_number, mut matches)| {
                matches.sort_by(by_start);
                RoundSchedule {
                    round_number,
                    matches,
                }
            })
            .collect();

        Self {
            rounds,
            live,
            upcoming,
        }
    }
}
