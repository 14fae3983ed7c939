//! Settings module - runtime configuration for the ingestion pipeline.

mod settings_model;

pub use settings_model::{EndpointPreference, FlexSettings};
