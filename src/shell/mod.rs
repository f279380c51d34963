// Composition root: configuration, HTTP surface, shared state and background workers.

pub mod config;
pub mod http;
pub mod state;
pub mod workers;
