pub mod army;
pub mod board;
pub mod challenge;
pub mod combat;
pub mod continent;
pub mod country;
pub mod driver;
pub mod error;
pub mod event;
pub mod game;
pub mod game_config;
pub mod hazard;
pub mod link;
pub mod player;
pub mod random;
pub mod session;
pub mod squad;
pub mod turn_phase;
pub mod unit;
