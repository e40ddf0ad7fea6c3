pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod orchestration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Ladder, MatchId, MatchKind, MatchRecord, MatchStatus, NewMatch, PlayerId, Resolution,
    SoloMatch, StatusUpdate, TeamId, TeamMatch, TimeMs,
};
pub use engine::RatingPolicy;
pub use error::AppError;
pub use lifecycle::{MatchEngine, MatchError};
pub use orchestration::{AutoValidationSweeper, Scheduler, SweepReport};
