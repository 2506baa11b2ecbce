pub mod config;
pub mod constants;
pub mod engine;
pub mod registry;
pub mod rng;
pub mod server_protocol;
pub mod session;
pub mod types;
