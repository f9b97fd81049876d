//! Tournament manager: the single entry point for every mutation.

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    RebuildOutcome, RebuildPolicy, RegistrationOutcome, ResultOutcome, Schedule, TournamentConfig,
};
use crate::bracket::{self, Match, MatchId, MatchStatus, TeamNumber};
use crate::db::{MatchRepository, StoreError, TeamRepository};
use crate::feed::{FeedNotifier, ScoreSnapshot, StateChangeNotification, load_snapshot};
use crate::registration::{
    RegistrationRequest, Team, TeamDetail, TeamUpdate, validate_registration, validate_update,
};
use crate::results::{self, ResultUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tournament manager
///
/// Bracket rebuilds and result updates run under one lock, so no reader of
/// the stores can observe a score landing on a half-rebuilt tree. Team
/// numbering is made atomic by the team store itself.
pub struct TournamentManager {
    teams: Arc<dyn TeamRepository>,
    matches: Arc<dyn MatchRepository>,
    config: TournamentConfig,
    notifier: FeedNotifier,
    write_lock: Mutex<()>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        matches: Arc<dyn MatchRepository>,
        config: TournamentConfig,
        notifier: FeedNotifier,
    ) -> Self {
        Self {
            teams,
            matches,
            config,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    /// Validate and persist a registration, then rebuild the bracket.
    ///
    /// # Errors
    ///
    /// * `TournamentError::Validation` - nothing was persisted
    /// * `TournamentError::Storage` - persisting the team or rebuilding failed
    pub async fn register_team(
        &self,
        request: RegistrationRequest,
    ) -> TournamentResult<RegistrationOutcome> {
        let validated = validate_registration(request)?;
        let players_saved = validated.registration.players.len();

        let team = self
            .teams
            .create_registration(&validated.registration)
            .await?;

        log::info!(
            "Registered team {} '{}' with {} players ({} dropped)",
            team.team_number,
            team.team_name,
            players_saved,
            validated.players_dropped
        );

        let bracket = self.rebuild_bracket().await.inspect_err(|e| {
            log::error!(
                "Team {} was saved but the bracket rebuild failed: {}",
                team.team_number,
                e
            );
        })?;

        Ok(RegistrationOutcome {
            team,
            players_saved,
            players_dropped: validated.players_dropped,
            bracket,
        })
    }

    /// Edit team metadata. The team number and the bracket are left alone.
    pub async fn update_team(
        &self,
        team_number: TeamNumber,
        update: TeamUpdate,
    ) -> TournamentResult<Team> {
        let update = validate_update(update)?;

        let team = self
            .teams
            .update_team(team_number, &update)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => TournamentError::TeamNotFound(team_number),
                other => TournamentError::Storage(other),
            })?;

        log::info!("Updated team {}", team_number);
        self.notifier
            .notify(StateChangeNotification::TeamUpdated { team_number });

        Ok(team)
    }

    /// Discard every match and regenerate the tree from all registered teams
    pub async fn rebuild_bracket(&self) -> TournamentResult<RebuildOutcome> {
        let _guard = self.write_lock.lock().await;

        if self.config.rebuild_policy == RebuildPolicy::BeforeKickoff
            && let Some(started) = self.first_started_match().await?
        {
            log::info!(
                "Skipping bracket rebuild: match {} is already {}",
                started.id,
                started.status
            );
            return Ok(RebuildOutcome::Skipped);
        }

        let teams: Vec<TeamNumber> = self
            .teams
            .list_teams()
            .await?
            .iter()
            .map(|t| t.team_number)
            .collect();

        let bracket = bracket::build(&teams, &self.config.bracket);
        let saved = self.matches.replace_bracket(&bracket).await?;

        let per_round: Vec<usize> = (1..=bracket.rounds)
            .map(|r| bracket.round(r).count())
            .collect();
        log::info!(
            "Rebuilt bracket for {} teams: size {}, {} matches, per round {:?}",
            teams.len(),
            bracket.bracket_size,
            saved.len(),
            per_round
        );

        self.notifier.notify(StateChangeNotification::BracketRebuilt {
            matches: saved.len(),
        });

        if bracket.is_empty() {
            Ok(RebuildOutcome::Cleared)
        } else {
            Ok(RebuildOutcome::Rebuilt {
                bracket_size: bracket.bracket_size,
                matches: saved.len(),
            })
        }
    }

    // A live match, or a finished one that was actually played (not a bye)
    async fn first_started_match(&self) -> TournamentResult<Option<Match>> {
        Ok(self.matches.list_matches(None).await?.into_iter().find(|m| {
            m.status == MatchStatus::Live || (m.status == MatchStatus::Finished && m.is_contested())
        }))
    }

    /// Record a score update and advance the winner.
    ///
    /// The match and every match its winner reached are saved together; the
    /// live feed is notified only after the save.
    ///
    /// # Errors
    ///
    /// * `TournamentError::MatchNotFound` - no state was changed
    /// * `TournamentError::Storage` - no state was changed
    pub async fn apply_result(
        &self,
        match_id: MatchId,
        update: ResultUpdate,
    ) -> TournamentResult<ResultOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut target = self
            .matches
            .find_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;

        let mut next = match target.next_match {
            Some(next_id) => {
                let next = self.matches.find_match(next_id).await?;
                if next.is_none() {
                    log::warn!("Match {} points at missing next match {}", match_id, next_id);
                }
                next
            }
            None => None,
        };

        let next_changed = results::apply_result(&mut target, &update, next.as_mut());
        let advanced = match next.filter(|_| next_changed) {
            Some(next) => self.carry_walkovers(next).await?,
            None => Vec::new(),
        };

        self.matches
            .save_result(&target, &advanced)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { id, .. } => TournamentError::MatchNotFound(id),
                other => TournamentError::Storage(other),
            })?;

        log::info!(
            "Match {} now {} {}-{}, winner {:?}",
            target.id,
            target.status,
            target.score1,
            target.score2,
            target.winner
        );

        self.notifier
            .notify(StateChangeNotification::ResultRecorded { match_id });

        let mut advanced = advanced.into_iter();
        Ok(ResultOutcome {
            updated: target,
            next_match: advanced.next(),
            walkovers: advanced.collect(),
        })
    }

    // Starting from the match a winner was just placed into, finish every
    // match that has no other feeder and carry the team onward.
    async fn carry_walkovers(&self, next: Match) -> TournamentResult<Vec<Match>> {
        let all = self.matches.list_matches(None).await?;
        let feeder_count = |id: MatchId| all.iter().filter(|m| m.next_match == Some(id)).count();

        let mut chain = vec![next];
        while let Some(current) = chain.last_mut()
            && feeder_count(current.id) == 1
            && current.award_walkover()
        {
            let (Some(winner), Some(next_id)) = (current.winner, current.next_match) else {
                break;
            };
            log::info!(
                "Team {} advances from match {} to match {} by walkover",
                winner,
                current.id,
                next_id
            );

            let Some(mut following) = all.iter().find(|m| m.id == next_id).cloned() else {
                break;
            };
            if !following.place_team(winner) {
                break;
            }
            chain.push(following);
        }

        Ok(chain)
    }

    /// Every match, for clients that pull instead of subscribing
    pub async fn full_snapshot(&self) -> TournamentResult<ScoreSnapshot> {
        Ok(load_snapshot(self.teams.as_ref(), self.matches.as_ref(), None).await?)
    }

    /// Matches currently in progress
    pub async fn live_snapshot(&self) -> TournamentResult<ScoreSnapshot> {
        Ok(load_snapshot(
            self.teams.as_ref(),
            self.matches.as_ref(),
            Some(MatchStatus::Live),
        )
        .await?)
    }

    pub async fn list_matches(&self) -> TournamentResult<Vec<Match>> {
        Ok(self.matches.list_matches(None).await?)
    }

    pub async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        self.matches
            .find_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    pub async fn list_teams(&self) -> TournamentResult<Vec<Team>> {
        Ok(self.teams.list_teams().await?)
    }

    /// Team with its players
    pub async fn get_team(&self, team_number: TeamNumber) -> TournamentResult<TeamDetail> {
        let team = self
            .teams
            .find_team(team_number)
            .await?
            .ok_or(TournamentError::TeamNotFound(team_number))?;
        let players = self.teams.list_players(team_number).await?;

        Ok(TeamDetail { team, players })
    }

    /// Matches grouped by round, plus the live and upcoming lists
    pub async fn schedule(&self) -> TournamentResult<Schedule> {
        let matches = self.matches.list_matches(None).await?;
        let names: HashMap<TeamNumber, String> = self
            .teams
            .list_teams()
            .await?
            .into_iter()
            .map(|t| (t.team_number, t.team_name))
            .collect();

        Ok(Schedule::from_matches(matches, &names))
    }

    /// Check both stores are reachable
    pub async fn health_check(&self) -> TournamentResult<()> {
        self.teams.ping().await?;
        self.matches.ping().await?;
        Ok(())
    }
}
