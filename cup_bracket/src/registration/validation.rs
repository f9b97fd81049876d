//! Registration field validation and normalization.

use super::models::{NewRegistration, Player, PlayerEntry, RegistrationRequest, TeamUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of team, captain and player names
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length of a stored phone number
pub const MAX_PHONE_LEN: usize = 30;

/// Maximum length of an email address
pub const MAX_EMAIL_LEN: usize = 254;

/// Maximum player entries per submission
pub const MAX_PLAYER_ENTRIES: usize = 11;

/// Country code prepended to every phone number
pub const PHONE_COUNTRY_CODE: &str = "+91";

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All invalid fields of a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` failed validation
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// A registration that passed validation, plus how many player rows were dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub registration: NewRegistration,
    pub players_dropped: usize,
}

/// Validate and normalize a registration submission.
///
/// Player entries missing a name or an identity document are dropped rather
/// than rejected; the number dropped is reported back. A submission where
/// every entry is incomplete is rejected.
///
/// # Errors
///
/// Returns every invalid field at once. Nothing is persisted on error.
pub fn validate_registration(
    request: RegistrationRequest,
) -> Result<ValidatedRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let team_name = required_name(&mut errors, "team_name", &request.team_name);
    let captain_name = required_name(&mut errors, "captain_name", &request.captain_name);
    let email = checked_email(&mut errors, &request.email);
    let phone = checked_phone(&mut errors, &request.phone);

    if request.players.is_empty() {
        errors.add("players", "At least one player entry is required");
    } else if request.players.len() > MAX_PLAYER_ENTRIES {
        errors.add(
            "players",
            format!("At most {MAX_PLAYER_ENTRIES} player entries are allowed"),
        );
    }

    let total_entries = request.players.len();
    let mut players = Vec::with_capacity(total_entries);
    let mut complete = 0;
    for (i, entry) in request.players.into_iter().enumerate() {
        let Some(player) = complete_player(entry) else {
            continue;
        };
        complete += 1;
        if player.name.chars().count() > MAX_NAME_LEN {
            errors.add(
                format!("players[{i}].name"),
                format!("Must be at most {MAX_NAME_LEN} characters"),
            );
            continue;
        }
        players.push(player);
    }

    if complete == 0 && (1..=MAX_PLAYER_ENTRIES).contains(&total_entries) {
        errors.add(
            "players",
            "At least one player entry needs both a name and an id card",
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let players_dropped = total_entries - players.len();
    if players_dropped > 0 {
        log::info!(
            "Dropping {} incomplete player entr{} for team '{}'",
            players_dropped,
            if players_dropped == 1 { "y" } else { "ies" },
            team_name
        );
    }

    Ok(ValidatedRegistration {
        registration: NewRegistration {
            team_name,
            captain_name,
            email,
            phone,
            players,
        },
        players_dropped,
    })
}

/// Validate and normalize a metadata edit
pub fn validate_update(update: TeamUpdate) -> Result<TeamUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let normalized = TeamUpdate {
        team_name: update
            .team_name
            .map(|v| required_name(&mut errors, "team_name", &v)),
        captain_name: update
            .captain_name
            .map(|v| required_name(&mut errors, "captain_name", &v)),
        email: update.email.map(|v| checked_email(&mut errors, &v)),
        phone: update.phone.map(|v| checked_phone(&mut errors, &v)),
    };

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

/// Normalize a phone number to `+91<digits>`.
///
/// Separators (spaces, dashes, dots, parentheses) are removed, then an exact
/// `+91` prefix, or failing that a single leading trunk `0`, is stripped.
///
/// # Errors
///
/// Returns a message when what remains is empty or not all digits.
pub fn normalize_phone(raw: &str) -> Result<String, String> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let national = if let Some(rest) = compact.strip_prefix(PHONE_COUNTRY_CODE) {
        rest
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        compact.as_str()
    };

    if national.is_empty() {
        return Err("Phone number is required".to_string());
    }
    if !national.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number may only contain digits".to_string());
    }

    let normalized = format!("{PHONE_COUNTRY_CODE}{national}");
    if normalized.len() > MAX_PHONE_LEN {
        return Err(format!("Must be at most {MAX_PHONE_LEN} characters"));
    }

    Ok(normalized)
}

/// Minimal structural email check: `local@domain.tld`
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn required_name(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required");
    } else if trimmed.chars().count() > MAX_NAME_LEN {
        errors.add(field, format!("Must be at most {MAX_NAME_LEN} characters"));
    }
    trimmed.to_string()
}

fn checked_email(errors: &mut ValidationErrors, value: &str) -> String {
    let trimmed = value.trim();
    if !is_valid_email(trimmed) {
        errors.add("email", "Enter a valid email address");
    }
    trimmed.to_string()
}

fn checked_phone(errors: &mut ValidationErrors, value: &str) -> String {
    match normalize_phone(value.trim()) {
        Ok(phone) => phone,
        Err(message) => {
            errors.add("phone", message);
            String::new()
        }
    }
}

fn complete_player(entry: PlayerEntry) -> Option<Player> {
    let name = entry.name?.trim().to_string();
    let id_card = entry.id_card?.trim().to_string();
    if name.is_empty() || id_card.is_empty() {
        return None;
    }
    Some(Player { name, id_card })
}
