//! GoLoc client: asks a GoLoc service for per-language line statistics of a
//! GitHub repository and keeps the lookup, panel and settings state for a UI.
//!
//! `app::AppState` is the single owner of that state; every change goes
//! through `app::Action`.

pub mod analyze;
pub mod app;
pub mod format;
pub mod logging;
pub mod model;
pub mod page;
pub mod platform;
pub mod proxy;
pub mod transport;
