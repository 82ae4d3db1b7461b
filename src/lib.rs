pub mod advisor;
pub mod cards;
pub mod composition;
pub mod config;
pub mod engine;
pub mod estimator;
pub mod game;
pub mod parse;
pub mod session;
pub mod simulate;
pub mod staking;
pub mod web;

pub use advisor::Advisor;
pub use config::AdvisorConfig;
pub use engine::{Engine, EngineConfig, Reply, TurnEvent};
pub use session::Session;
