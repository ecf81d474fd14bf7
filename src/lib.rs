// Public API for the server binary, the play client, and integration tests

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod protocol;
pub mod reaper;
pub mod source;
pub mod store;
pub mod types;
