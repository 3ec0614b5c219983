//! Stolenbot - stream-listening serial-number lookup bot

pub mod commands;
pub mod compose;
pub mod config;
pub mod error;
pub mod lookup;
pub mod message;
pub mod platform;
pub mod route;
pub mod strip;
pub mod telemetry;
pub mod template;
