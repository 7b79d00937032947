use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use log::{info, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::ClientError;
use crate::models::turn::{Role, Session, Turn};
use crate::services::backend::{ChatBackend, HistoryTurn, SessionEntry};
use crate::services::payload_parser;

/// Owns the ordered turn list for the active session and the cached session
/// list. Cloneable handle over shared state; locks are held only across
/// non-await sections, so a slow history fetch resolving after a session
/// switch reduces to the requested-id check in `load`.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn ChatBackend>,
    user_id: String,
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    /// The session most recently asked for. Responses for anything else are
    /// stale and get discarded.
    requested_session_id: Option<String>,
    session: Session,
    entries: Vec<SessionEntry>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn ChatBackend>, user_id: impl Into<String>) -> SessionStore {
        SessionStore {
            backend,
            user_id: user_id.into(),
            inner: Arc::new(Mutex::new(StoreInner::default())),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Snapshot of the current session for read-only display.
    pub fn session(&self) -> Session {
        self.inner.lock().unwrap().session.clone()
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.inner.lock().unwrap().requested_session_id.clone()
    }

    pub fn is_current(&self, session_id: &str) -> bool {
        self.inner.lock().unwrap().requested_session_id.as_deref() == Some(session_id)
    }

    /// Appends a turn to the current session. Prior turns are never mutated.
    pub fn append(&self, turn: Turn) {
        self.inner.lock().unwrap().session.turns.push(turn);
    }

    /// Fetches and installs the remote history for `session_id`. Fails
    /// softly: a transport or decode error yields an empty session. If a
    /// newer session was requested while the fetch was in flight, the result
    /// is discarded and the store is left untouched.
    pub async fn load(&self, session_id: &str) -> Session {
        self.inner.lock().unwrap().requested_session_id = Some(session_id.to_string());

        let history = match self.backend.session_chat(&self.user_id, session_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load history for session {}: {}", session_id, e);
                Vec::new()
            }
        };
        let session = rebuild_session(session_id, history);

        let mut inner = self.inner.lock().unwrap();
        if inner.requested_session_id.as_deref() != Some(session_id) {
            info!("Discarding stale history response for session {}", session_id);
            return inner.session.clone();
        }
        inner.session = session.clone();
        session
    }

    /// Generates a client-side session id; the backend creates the durable
    /// record lazily on the first message. The new session becomes current
    /// immediately, and a provisionally named entry keeps it visible in the
    /// list until the next server refresh.
    pub fn create_session(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        let session_id = format!("{}-{}", self.user_id, &suffix[..8]);

        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(
            0,
            SessionEntry {
                session_id: session_id.clone(),
                name: Some(format!("New chat {}", Local::now().format("%b %e %H:%M"))),
            },
        );
        inner.requested_session_id = Some(session_id.clone());
        inner.session = Session::empty(session_id.as_str());
        session_id
    }

    /// Refreshes the cached session list from the remote log. A provisional
    /// entry for the current session is kept if the server log has not
    /// caught up with it yet.
    pub async fn list_sessions(&self) -> Result<Vec<SessionEntry>, ClientError> {
        let fetched = self.backend.sessions_log(&self.user_id).await?;

        let mut inner = self.inner.lock().unwrap();
        let mut entries = fetched;
        if let Some(current) = inner.requested_session_id.clone() {
            let missing = !entries.iter().any(|e| e.session_id == current);
            if missing {
                if let Some(provisional) = inner
                    .entries
                    .iter()
                    .find(|e| e.session_id == current)
                    .cloned()
                {
                    entries.insert(0, provisional);
                }
            }
        }
        inner.entries = entries.clone();
        Ok(entries)
    }

    /// Last-known session list without touching the network.
    pub fn sessions(&self) -> Vec<SessionEntry> {
        self.inner.lock().unwrap().entries.clone()
    }
}

/// Normalizes wire roles and reattaches the active payload: assistant turns
/// are re-classified newest to oldest and only the first hit keeps its
/// payload. Everything older is historical and stays plain text.
fn rebuild_session(session_id: &str, history: Vec<HistoryTurn>) -> Session {
    let mut turns: Vec<Turn> = history
        .into_iter()
        .map(|wire| Turn {
            role: Role::from_wire(&wire.role),
            text: wire.text,
            payload: None,
        })
        .collect();

    for turn in turns.iter_mut().rev() {
        if turn.role != Role::Assistant {
            continue;
        }
        if let Some(payload) = payload_parser::classify_payload(&turn.text) {
            turn.payload = Some(payload);
            break;
        }
    }

    Session {
        session_id: session_id.to_string(),
        turns,
    }
}

/// Periodic session-list refresh. A liveness convenience for sessions
/// created elsewhere, not a correctness dependency.
pub struct SessionListPoller {
    handle: JoinHandle<()>,
}

impl SessionListPoller {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SessionListPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn spawn_session_list_poller<F>(
    store: SessionStore,
    interval: Duration,
    on_update: F,
) -> SessionListPoller
where
    F: Fn(Vec<SessionEntry>) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; the on-mount refresh already
        // covers that moment.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.list_sessions().await {
                Ok(entries) => on_update(entries),
                Err(e) => warn!("Session list refresh failed: {}", e),
            }
        }
    });
    SessionListPoller { handle }
}
