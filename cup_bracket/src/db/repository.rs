//! Repository trait definitions for the team and match stores.
//!
//! The tournament manager only talks to these traits, so the PostgreSQL
//! implementations below can be swapped for the in-memory ones in tests.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::errors::{StoreError, StoreResult};
use crate::bracket::{Bracket, Match, MatchId, MatchStatus, TeamNumber};
use crate::registration::{NewRegistration, Player, Team, TeamUpdate};

/// Trait for team/registration store operations
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Persist a team and its players atomically under the next team number
    async fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Team>;

    /// All teams ordered by team number
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;

    /// Find team by number
    async fn find_team(&self, team_number: TeamNumber) -> StoreResult<Option<Team>>;

    /// Players of a team in submission order
    async fn list_players(&self, team_number: TeamNumber) -> StoreResult<Vec<Player>>;

    /// Apply a metadata edit and return the updated team
    async fn update_team(&self, team_number: TeamNumber, update: &TeamUpdate)
    -> StoreResult<Team>;

    /// Check the store is reachable
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Trait for match store operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Discard every match and persist `bracket` in its place.
    ///
    /// Returns the new matches in bracket node order with their assigned IDs.
    async fn replace_bracket(&self, bracket: &Bracket) -> StoreResult<Vec<Match>>;

    /// Find match by ID
    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>>;

    /// Matches ordered by round, start time and ID, optionally filtered by status
    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>>;

    /// Persist an updated match and the downstream matches its winner reached,
    /// as one unit
    async fn save_result(&self, updated: &Match, advanced: &[Match]) -> StoreResult<()>;

    /// Check the store is reachable
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Default PostgreSQL implementation of `TeamRepository`
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn team_from_row(row: &PgRow) -> Team {
    Team {
        team_number: row.get("team_number"),
        team_name: row.get("team_name"),
        captain_name: row.get("captain_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Team> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent registrations until commit so numbers stay gap-free
        sqlx::query("LOCK TABLE registrations IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(team_number), 0) + 1 AS next FROM registrations",
        )
        .fetch_one(&mut *tx)
        .await?
        .get("next");

        let row = sqlx::query(
            r#"
            INSERT INTO registrations (team_number, team_name, captain_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING team_number, team_name, captain_name, email, phone, created_at
            "#,
        )
        .bind(next)
        .bind(&registration.team_name)
        .bind(&registration.captain_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .fetch_one(&mut *tx)
        .await?;

        for player in &registration.players {
            sqlx::query("INSERT INTO players (team_number, name, id_card) VALUES ($1, $2, $3)")
                .bind(next)
                .bind(&player.name)
                .bind(&player.id_card)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(team_from_row(&row))
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT team_number, team_name, captain_name, email, phone, created_at
             FROM registrations ORDER BY team_number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn find_team(&self, team_number: TeamNumber) -> StoreResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT team_number, team_name, captain_name, email, phone, created_at
             FROM registrations WHERE team_number = $1",
        )
        .bind(team_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(team_from_row))
    }

    async fn list_players(&self, team_number: TeamNumber) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query("SELECT name, id_card FROM players WHERE team_number = $1 ORDER BY id")
            .bind(team_number)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| Player {
                name: r.get("name"),
                id_card: r.get("id_card"),
            })
            .collect())
    }

    async fn update_team(
        &self,
        team_number: TeamNumber,
        update: &TeamUpdate,
    ) -> StoreResult<Team> {
        let row = sqlx::query(
            r#"
            UPDATE registrations
            SET team_name = COALESCE($2, team_name),
                captain_name = COALESCE($3, captain_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone)
            WHERE team_number = $1
            RETURNING team_number, team_name, captain_name, email, phone, created_at
            "#,
        )
        .bind(team_number)
        .bind(update.team_name.as_deref())
        .bind(update.captain_name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.phone.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).ok_or(StoreError::NotFound {
            entity: "team",
            id: team_number,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `MatchRepository`
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "id, round_number, label, court, start_time, team1, team2, \
                             score1, score2, status, winner, next_match";

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let id: MatchId = row.get("id");
    let corrupt = |reason: String| StoreError::Corrupt {
        entity: "match",
        reason: format!("match {id}: {reason}"),
    };

    let status: String = row.get("status");
    let status = status
        .parse::<MatchStatus>()
        .map_err(|e| corrupt(e.to_string()))?;
    let round_number = u32::try_from(row.get::<i32, _>("round_number"))
        .map_err(|e| corrupt(format!("round_number: {e}")))?;
    let score1 = u32::try_from(row.get::<i32, _>("score1"))
        .map_err(|e| corrupt(format!("score1: {e}")))?;
    let score2 = u32::try_from(row.get::<i32, _>("score2"))
        .map_err(|e| corrupt(format!("score2: {e}")))?;

    Ok(Match {
        id,
        round_number,
        label: row.get("label"),
        court: row.get("court"),
        start_time: row.get("start_time"),
        team1: row.get("team1"),
        team2: row.get("team2"),
        score1,
        score2,
        status,
        winner: row.get("winner"),
        next_match: row.get("next_match"),
    })
}

fn db_int(value: u32, column: &'static str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt {
        entity: "match",
        reason: format!("{column} {value} exceeds column range"),
    })
}

async fn write_match(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    m: &Match,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE matches
        SET team1 = $2, team2 = $3, score1 = $4, score2 = $5, status = $6, winner = $7
        WHERE id = $1
        "#,
    )
    .bind(m.id)
    .bind(m.team1)
    .bind(m.team2)
    .bind(db_int(m.score1, "score1")?)
    .bind(db_int(m.score2, "score2")?)
    .bind(m.status.as_str())
    .bind(m.winner)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "match",
            id: m.id,
        });
    }

    Ok(())
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn replace_bracket(&self, bracket: &Bracket) -> StoreResult<Vec<Match>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM matches").execute(&mut *tx).await?;

        let mut ids = Vec::with_capacity(bracket.len());
        for node in &bracket.nodes {
            let row = sqlx::query(
                r#"
                INSERT INTO matches
                    (round_number, label, court, start_time, team1, team2, score1, score2, status, winner)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING id
                "#,
            )
            .bind(db_int(node.round_number, "round_number")?)
            .bind(&node.label)
            .bind(&node.court)
            .bind(node.start_time)
            .bind(node.team1)
            .bind(node.team2)
            .bind(db_int(node.score1, "score1")?)
            .bind(db_int(node.score2, "score2")?)
            .bind(node.status.as_str())
            .bind(node.winner)
            .fetch_one(&mut *tx)
            .await?;

            ids.push(row.get::<MatchId, _>("id"));
        }

        let mut matches = Vec::with_capacity(bracket.len());
        for (node, &id) in bracket.nodes.iter().zip(&ids) {
            let next_match = node.next.and_then(|index| ids.get(index).copied());
            if let Some(next_id) = next_match {
                sqlx::query("UPDATE matches SET next_match = $1 WHERE id = $2")
                    .bind(next_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            matches.push(node.to_match(id, next_match));
        }

        tx.commit().await?;

        Ok(matches)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE ($1::VARCHAR IS NULL OR status = $1)
             ORDER BY round_number, start_time, id"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn save_result(&self, updated: &Match, advanced: &[Match]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        write_match(&mut tx, updated).await?;
        for m in advanced {
            write_match(&mut tx, m).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
