//! HTTP surface of the Postgres Assistant: short-lived sessions over
//! client-supplied database credentials, raw SQL execution and
//! natural-language to SQL generation.

pub mod config;
pub mod database;
pub mod handlers;
pub mod router;
pub mod security;
pub mod services;
pub mod state;
pub mod utils;
