//! Tournament module: the serialized entry point over the bracket, the
//! result processor, registration intake and the stores.
//!
//! ## Example
//!
//! ```
//! use cup_bracket::db::{InMemoryMatchRepository, InMemoryTeamRepository};
//! use cup_bracket::feed::notifier;
//! use cup_bracket::registration::{PlayerEntry, RegistrationRequest};
//! use cup_bracket::tournament::{TournamentConfig, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (notifier, _events) = notifier(16);
//!     let manager = TournamentManager::new(
//!         Arc::new(InMemoryTeamRepository::new()),
//!         Arc::new(InMemoryMatchRepository::new()),
//!         TournamentConfig::default(),
//!         notifier,
//!     );
//!
//!     for name in ["Aces", "Blockers", "Spikers"] {
//!         manager
//!             .register_team(RegistrationRequest {
//!                 team_name: name.to_string(),
//!                 captain_name: "Captain".to_string(),
//!                 email: "captain@example.com".to_string(),
//!                 phone: "9876543210".to_string(),
//!                 players: vec![PlayerEntry::new("Player", "id_cards/player.png")],
//!             })
//!             .await?;
//!     }
//!
//!     let matches = manager.list_matches().await?;
//!     assert_eq!(matches.len(), 3);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    RebuildOutcome, RebuildPolicy, RegistrationOutcome, ResultOutcome, RoundSchedule, Schedule,
    ScheduleEntry, TournamentConfig,
};
