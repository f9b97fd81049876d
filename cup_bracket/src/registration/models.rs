//! Team and registration data models.

use crate::bracket::TeamNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Sequential team number, never reused
    pub team_number: TeamNumber,
    pub team_name: String,
    pub captain_name: String,
    pub email: String,
    /// Normalized phone number (`+91...`)
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// A player on a team roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Reference to the stored identity document
    pub id_card: String,
}

/// Team with its roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub players: Vec<Player>,
}

/// One player row of a registration submission.
///
/// Either field may be missing; incomplete rows are dropped during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id_card: Option<String>,
}

impl PlayerEntry {
    /// Create a complete entry
    pub fn new(name: impl Into<String>, id_card: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id_card: Some(id_card.into()),
        }
    }
}

/// Raw registration submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub team_name: String,
    pub captain_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
}

/// Validated registration ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub team_name: String,
    pub captain_name: String,
    pub email: String,
    pub phone: String,
    pub players: Vec<Player>,
}

/// Metadata edit for an existing team; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUpdate {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub captain_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl TeamUpdate {
    /// Apply the update on top of an existing team
    pub fn apply_to(&self, team: &mut Team) {
        if let Some(team_name) = &self.team_name {
            team.team_name = team_name.clone();
        }
        if let Some(captain_name) = &self.captain_name {
            team.captain_name = captain_name.clone();
        }
        if let Some(email) = &self.email {
            team.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            team.phone = phone.clone();
        }
    }
}
