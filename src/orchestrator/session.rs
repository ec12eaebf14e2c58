//! Independent orchestrators keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{Orchestrator, RouteResponse};
use crate::error::MuseError;

type Factory = dyn Fn() -> Result<Orchestrator, MuseError> + Send + Sync;

/// One [`Orchestrator`] per session, created on first use by a factory.
///
/// Sessions share nothing mutable: messages to different sessions run
/// concurrently, messages to the same session are serialized.
pub struct SessionManager {
    factory: Arc<Factory>,
    sessions: Mutex<HashMap<String, Arc<Mutex<Orchestrator>>>>,
}

impl SessionManager {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Orchestrator, MuseError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn session(&self, id: &str) -> Result<Arc<Mutex<Orchestrator>>, MuseError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(id) {
            return Ok(Arc::clone(existing));
        }
        debug!(session = id, "creating session");
        let orchestrator = Arc::new(Mutex::new((self.factory)()?));
        sessions.insert(id.to_string(), Arc::clone(&orchestrator));
        Ok(orchestrator)
    }

    pub async fn route(&self, session: &str, message: &str) -> Result<RouteResponse, MuseError> {
        let orchestrator = self.session(session).await?;
        let mut orchestrator = orchestrator.lock().await;
        orchestrator.route(message).await
    }

    /// Reset one session's agents. Unknown sessions are left alone.
    pub async fn reset(&self, session: &str) -> bool {
        let existing = self.sessions.lock().await.get(session).cloned();
        match existing {
            Some(orchestrator) => {
                orchestrator.lock().await.reset();
                true
            }
            None => false,
        }
    }

    /// Drop a session and everything it owns.
    pub async fn remove(&self, session: &str) -> bool {
        self.sessions.lock().await.remove(session).is_some()
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
