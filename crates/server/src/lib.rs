pub mod api;
pub mod blob_factory;
pub mod config;
pub mod error;
pub mod manager_factory;
pub mod state_factory;
pub mod telemetry;
