use axum::extract::FromRef;
use session_registry::SessionRegistry;
use std::sync::Arc;

use crate::config::Settings;
use crate::database::{DatabaseClient, DbCredentials};
use crate::services::SqlGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry<DbCredentials>,
    pub database: Arc<dyn DatabaseClient>,
    pub generator: Arc<dyn SqlGenerator>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        sessions: SessionRegistry<DbCredentials>,
        database: Arc<dyn DatabaseClient>,
        generator: Arc<dyn SqlGenerator>,
        settings: Settings,
    ) -> Self {
        Self {
            sessions,
            database,
            generator,
            settings: Arc::new(settings),
        }
    }
}

impl FromRef<AppState> for SessionRegistry<DbCredentials> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
