pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod parking;
pub mod state;
pub mod stats;
pub mod store;
