//! Arena simulation modules

pub mod arena;
pub mod engine;
pub mod player;
pub mod projectile;
pub mod scoreboard;
pub mod simulation;

pub use engine::{ArenaEngine, EngineCommand, EngineError, EngineHandle, EngineSettings};
pub use player::Player;
pub use projectile::Projectile;
