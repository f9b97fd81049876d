//! In-memory team and match stores.
//!
//! Same contracts as the PostgreSQL repositories. Each store keeps its state
//! behind one lock, so every trait call is atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::repository::{MatchRepository, TeamRepository};
use crate::bracket::{Bracket, Match, MatchId, MatchStatus, TeamNumber};
use crate::registration::{NewRegistration, Player, Team, TeamUpdate};

#[derive(Default)]
struct TeamState {
    teams: BTreeMap<TeamNumber, Team>,
    players: BTreeMap<TeamNumber, Vec<Player>>,
}

/// In-memory `TeamRepository`
#[derive(Default)]
pub struct InMemoryTeamRepository {
    state: RwLock<TeamState>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Team> {
        let mut state = self.state.write().await;

        let team_number = state.teams.keys().next_back().map_or(1, |last| last + 1);
        let team = Team {
            team_number,
            team_name: registration.team_name.clone(),
            captain_name: registration.captain_name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            created_at: Utc::now(),
        };

        state.teams.insert(team_number, team.clone());
        state
            .players
            .insert(team_number, registration.players.clone());

        Ok(team)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.state.read().await.teams.values().cloned().collect())
    }

    async fn find_team(&self, team_number: TeamNumber) -> StoreResult<Option<Team>> {
        Ok(self.state.read().await.teams.get(&team_number).cloned())
    }

    async fn list_players(&self, team_number: TeamNumber) -> StoreResult<Vec<Player>> {
        Ok(self
            .state
            .read()
            .await
            .players
            .get(&team_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_team(
        &self,
        team_number: TeamNumber,
        update: &TeamUpdate,
    ) -> StoreResult<Team> {
        let mut state = self.state.write().await;
        let team = state
            .teams
            .get_mut(&team_number)
            .ok_or(StoreError::NotFound {
                entity: "team",
                id: team_number,
            })?;

        update.apply_to(team);
        Ok(team.clone())
    }
}

struct MatchState {
    matches: BTreeMap<MatchId, Match>,
    next_id: MatchId,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            matches: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// In-memory `MatchRepository`.
///
/// IDs keep increasing across rebuilds, as with a database sequence.
#[derive(Default)]
pub struct InMemoryMatchRepository {
    state: RwLock<MatchState>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn replace_bracket(&self, bracket: &Bracket) -> StoreResult<Vec<Match>> {
        let mut state = self.state.write().await;
        state.matches.clear();

        let first_id = state.next_id;
        let id_of = |index: usize| first_id + index as MatchId;

        let matches: Vec<Match> = bracket
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| node.to_match(id_of(i), node.next.map(id_of)))
            .collect();

        state.next_id = first_id + matches.len() as MatchId;
        for m in &matches {
            state.matches.insert(m.id, m.clone());
        }

        Ok(matches)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.state.read().await.matches.get(&match_id).cloned())
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>> {
        let state = self.state.read().await;
        let mut matches: Vec<Match> = state
            .matches
            .values()
            .filter(|m| status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();

        matches.sort_by_key(|m| (m.round_number, m.start_time, m.id));
        Ok(matches)
    }

    async fn save_result(&self, updated: &Match, advanced: &[Match]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        // Check every row before writing any
        for m in std::iter::once(updated).chain(advanced) {
            if !state.matches.contains_key(&m.id) {
                return Err(StoreError::NotFound {
                    entity: "match",
                    id: m.id,
                });
            }
        }

        for m in std::iter::once(updated).chain(advanced) {
            state.matches.insert(m.id, m.clone());
        }

        Ok(())
    }
}
