pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod integrity;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;
pub mod types;
