// Core moderation module - client, normalizer and the fallback heuristic.
// Following the same layout as the other core modules.

pub mod fallback;
pub mod moderation_models;
pub mod moderation_service;
pub mod normalizer;

pub use moderation_models::*;
pub use moderation_service::*;
pub use normalizer::normalize;
