// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "session/mod.rs"]
pub mod session;

#[path = "analytics/mod.rs"]
pub mod analytics;
