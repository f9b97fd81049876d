//! Registration intake: team and player models plus submission validation.

pub mod models;
pub mod validation;

pub use models::{
    NewRegistration, Player, PlayerEntry, RegistrationRequest, Team, TeamDetail, TeamUpdate,
};
pub use validation::{
    FieldError, MAX_PLAYER_ENTRIES, ValidatedRegistration, ValidationErrors, normalize_phone,
    validate_registration, validate_update,
};
