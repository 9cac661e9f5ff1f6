// Meal Max backend: meal catalog, leaderboard, and combatant battles.

pub mod api;
pub mod battle;
pub mod config;
pub mod db;
pub mod dice;
pub mod error;
pub mod leaderboard;
pub mod meal;
pub mod metrics;
