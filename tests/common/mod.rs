#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use AdukiChatClient::error::ClientError;
use AdukiChatClient::services::backend::{ChatBackend, ChatOutcome, HistoryTurn, SessionEntry};

/// Latch pair for holding a fake request open: the fake signals `started`
/// when the request arrives and parks on `release` until the test lets it
/// finish. `Notify` stores a permit, so releasing early is safe.
#[derive(Clone, Default)]
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Scripted stand-in for the chat backend with controllable completion
/// order, for the stale-response tests that mock expectations cannot
/// express.
#[derive(Default)]
pub struct FakeBackend {
    histories: Mutex<HashMap<String, Vec<HistoryTurn>>>,
    failing_histories: Mutex<HashSet<String>>,
    history_gates: Mutex<HashMap<String, Gate>>,
    replies: Mutex<VecDeque<Result<ChatOutcome, String>>>,
    chat_gate: Mutex<Option<Gate>>,
    sessions: Mutex<Vec<SessionEntry>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeBackend {
    pub fn new() -> Arc<FakeBackend> {
        Arc::new(FakeBackend::default())
    }

    pub fn set_history(&self, session_id: &str, turns: &[(&str, &str)]) {
        let history = turns
            .iter()
            .map(|(role, text)| HistoryTurn {
                role: role.to_string(),
                text: text.to_string(),
            })
            .collect();
        self.histories
            .lock()
            .unwrap()
            .insert(session_id.to_string(), history);
    }

    pub fn fail_history(&self, session_id: &str) {
        self.failing_histories
            .lock()
            .unwrap()
            .insert(session_id.to_string());
    }

    /// Makes history fetches for `session_id` wait on the returned gate.
    pub fn gate_history(&self, session_id: &str) -> Gate {
        let gate = Gate::default();
        self.history_gates
            .lock()
            .unwrap()
            .insert(session_id.to_string(), gate.clone());
        gate
    }

    /// Makes chat sends wait on the returned gate.
    pub fn gate_chat(&self) -> Gate {
        let gate = Gate::default();
        *self.chat_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_reply(&self, outcome: ChatOutcome) {
        self.replies.lock().unwrap().push_back(Ok(outcome));
    }

    pub fn push_chat_failure(&self, reason: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    pub fn set_sessions(&self, entries: Vec<SessionEntry>) {
        *self.sessions.lock().unwrap() = entries;
    }

    /// (message, session_id) pairs in send order.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn send_chat(
        &self,
        message: &str,
        _user_id: &str,
        session_id: &str,
    ) -> Result<ChatOutcome, ClientError> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), session_id.to_string()));

        let gate = self.chat_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(reason)) => Err(ClientError::Protocol(reason)),
            None => Ok(ChatOutcome::Reply("ok".to_string())),
        }
    }

    async fn sessions_log(&self, _user_id: &str) -> Result<Vec<SessionEntry>, ClientError> {
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn session_chat(
        &self,
        _user_id: &str,
        session_id: &str,
    ) -> Result<Vec<HistoryTurn>, ClientError> {
        let gate = self.history_gates.lock().unwrap().get(session_id).cloned();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        if self.failing_histories.lock().unwrap().contains(session_id) {
            return Err(ClientError::Protocol(format!(
                "no history for {}",
                session_id
            )));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
