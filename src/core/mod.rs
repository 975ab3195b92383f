//! Core module - Preferences, session state, configuration and events

pub mod config;
pub mod events;
pub mod preferences;
pub mod state;
