pub mod analytics_models;
pub mod analytics_service;

pub use analytics_models::*;
pub use analytics_service::*;
