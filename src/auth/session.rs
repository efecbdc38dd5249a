//! In-memory login sessions keyed by a random cookie value.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Role;

/// A logged-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

/// Session table. Sessions live until logout or process restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return its id.
    pub async fn create(&self, username: &str, role: Role) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session {
            username: username.to_string(),
            role,
            logged_in_at: Utc::now(),
        };
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }
}
