pub mod actions;
pub mod api_client;
pub mod controller;
pub mod controllers;
pub mod layout;
pub mod settings_store;
pub mod state;
pub mod theme;

pub use actions::{Action, AnalyzeStatus, StateEvent};
pub use state::AppState;
