use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{error, info, warn};
use url::Url;

use crate::error::ClientError;
use crate::models::turn::{Session, Turn};
use crate::models::voice::VoiceState;
use crate::services::backend::{ChatBackend, ChatOutcome, SessionEntry};
use crate::services::payload_parser;
use crate::services::session_store::{
    spawn_session_list_poller, SessionListPoller, SessionStore,
};
use crate::services::voice_orchestrator::{
    SpeechPlatform, VoiceCapabilities, VoiceEffect, VoiceEvent, VoiceOrchestrator,
};

/// What a submit produced, beyond the turn list itself.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The assistant replied and the turn was appended.
    Replied(Turn),
    /// The backend wants the Google-connect flow run first. No assistant
    /// turn is appended; the UI layer opens the URL.
    ConnectGoogle(Url),
    /// The reply resolved after a session switch and was discarded.
    Discarded,
}

/// The surface exposed to the UI layer: a read-only view of turns, submit
/// and email-selection operations, and the current voice state. Everything
/// else (rendering, routing, popups) lives outside this crate.
pub struct ConversationController {
    store: SessionStore,
    backend: Arc<dyn ChatBackend>,
    platform: Arc<dyn SpeechPlatform>,
    voice: Mutex<VoiceOrchestrator>,
    reply_prefix: Mutex<Option<String>>,
    awaiting_first_send: AtomicBool,
}

impl ConversationController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        platform: Arc<dyn SpeechPlatform>,
        user_id: impl Into<String>,
    ) -> ConversationController {
        let store = SessionStore::new(backend.clone(), user_id);
        let capabilities = VoiceCapabilities::of(platform.as_ref());
        ConversationController {
            store,
            backend,
            platform,
            voice: Mutex::new(VoiceOrchestrator::new(capabilities)),
            reply_prefix: Mutex::new(None),
            awaiting_first_send: AtomicBool::new(false),
        }
    }

    /// Read-only ordered snapshot of the active session's turns.
    pub fn turns(&self) -> Vec<Turn> {
        self.store.session().turns
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice.lock().unwrap().state()
    }

    /// Last-known session list (cache; see `refresh_sessions`).
    pub fn sessions(&self) -> Vec<SessionEntry> {
        self.store.sessions()
    }

    /// Fetches the session list from the remote log. Called on mount and
    /// after the first successful send in a brand-new session.
    pub async fn refresh_sessions(&self) -> Result<Vec<SessionEntry>, ClientError> {
        self.store.list_sessions().await
    }

    /// Periodic list refresh for sessions created elsewhere. Cancellable via
    /// the returned handle.
    pub fn start_session_list_poller(&self, interval: Duration) -> SessionListPoller {
        spawn_session_list_poller(self.store.clone(), interval, |_| {})
    }

    /// Creates a client-side session and makes it current. The backend
    /// learns about it on the first message.
    pub fn new_session(&self) -> String {
        self.awaiting_first_send.store(true, Ordering::SeqCst);
        self.store.create_session()
    }

    pub async fn switch_session(&self, session_id: &str) -> Session {
        self.awaiting_first_send.store(false, Ordering::SeqCst);
        self.store.load(session_id).await
    }

    /// Sends one user message. The user's turn stays in place whatever
    /// happens; an assistant turn is appended only when a reply arrives and
    /// the issuing session is still current.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ClientError> {
        let message = {
            let mut prefix = self.reply_prefix.lock().unwrap();
            match prefix.take() {
                Some(prefix) => format!("{}{}", prefix, text),
                None => text.to_string(),
            }
        };

        let issuing_session = match self.store.current_session_id() {
            Some(id) => id,
            None => self.new_session(),
        };
        self.store.append(Turn::user(message.as_str()));

        let outcome = self
            .backend
            .send_chat(&message, self.store.user_id(), &issuing_session)
            .await;

        match outcome {
            Err(e) => {
                error!("Chat request failed for session {}: {}", issuing_session, e);
                Err(e)
            }
            Ok(ChatOutcome::ConnectGoogle { connect_url }) => {
                Ok(SubmitOutcome::ConnectGoogle(connect_url))
            }
            Ok(ChatOutcome::Reply(reply)) => {
                if !self.store.is_current(&issuing_session) {
                    info!(
                        "Discarding chat reply issued from session {}",
                        issuing_session
                    );
                    return Ok(SubmitOutcome::Discarded);
                }
                let payload = payload_parser::classify_payload(&reply);
                let turn = Turn::assistant(reply, payload);
                self.store.append(turn.clone());

                if self.awaiting_first_send.swap(false, Ordering::SeqCst) {
                    // Pick up the server-side record created by this send.
                    if let Err(e) = self.store.list_sessions().await {
                        warn!("Post-send session list refresh failed: {}", e);
                    }
                }
                Ok(SubmitOutcome::Replied(turn))
            }
        }
    }

    /// Seeds the next outgoing message with a reply-addressed prefix. Only
    /// items in the *active* email list are selectable; anything older is
    /// inert.
    pub fn select_email(&self, thread_id: &str, from: &str) -> bool {
        let session = self.store.session();
        let selectable = session
            .active_email_list()
            .map(|items| items.iter().any(|item| item.thread_id == thread_id))
            .unwrap_or(false);
        if !selectable {
            return false;
        }
        *self.reply_prefix.lock().unwrap() = Some(format!(
            "Reply to the email from {} (thread {}): ",
            from, thread_id
        ));
        true
    }

    /// Feeds one event into the voice state machine and executes whatever
    /// effects it requests.
    pub async fn on_voice_event(&self, event: VoiceEvent) {
        let effects = self.voice.lock().unwrap().handle(event);
        self.run_effects(effects).await;
    }

    pub async fn start_listening(&self) {
        self.on_voice_event(VoiceEvent::StartListening).await;
    }

    pub async fn stop_voice(&self) {
        self.on_voice_event(VoiceEvent::StopAll).await;
    }

    async fn run_effects(&self, effects: Vec<VoiceEffect>) {
        for effect in effects {
            match effect {
                VoiceEffect::StartRecognition => self.platform.start_recognition(),
                VoiceEffect::CancelRecognition => self.platform.cancel_recognition(),
                VoiceEffect::CancelSynthesis => self.platform.cancel_speech(),
                VoiceEffect::Speak(text) => self.platform.speak(&text),
                VoiceEffect::SendMessage(text) => {
                    // A reply carrying a structured payload is never spoken;
                    // only a plain-text reply feeds synthesis.
                    let spoken_text = match self.submit(&text).await {
                        Ok(SubmitOutcome::Replied(turn)) if turn.payload.is_none() => {
                            Some(turn.text)
                        }
                        Ok(_) => None,
                        Err(e) => {
                            error!("Voice-initiated send failed: {}", e);
                            None
                        }
                    };
                    let follow_up = self
                        .voice
                        .lock()
                        .unwrap()
                        .handle(VoiceEvent::ReplyReady { spoken_text });
                    for effect in follow_up {
                        if let VoiceEffect::Speak(text) = effect {
                            self.platform.speak(&text);
                        }
                    }
                }
            }
        }
    }
}
