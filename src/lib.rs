pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod server;
pub mod state;
pub mod storage;
