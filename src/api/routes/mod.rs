//! API Route Handlers

pub mod assets;
pub mod assistant;
pub mod chain;
pub mod chat;
pub mod dashboard;
pub mod generate;
pub mod health;
pub mod sandbox;
