pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod rate_limit;
pub mod seed;
pub mod similarity;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
