use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config;
use crate::error::ClientError;

/// One entry in the remote session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SessionEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.session_id)
    }
}

/// One turn as stored in the remote history. `role` is the raw wire string
/// ("user" or "bot"); normalization happens in the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub text: String,
}

/// Outcome of a chat send. The backend either replies with text or asks the
/// client to run the Google-connect flow first.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    Reply(String),
    ConnectGoogle { connect_url: Url },
}

/// The remote chat backend, consumed through simple request/response calls.
/// A trait so tests can stand in a scripted double for the real server.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(
        &self,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<ChatOutcome, ClientError>;

    async fn sessions_log(&self, user_id: &str) -> Result<Vec<SessionEntry>, ClientError>;

    async fn session_chat(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<HistoryTurn>, ClientError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    user_id: &'a str,
    session_id: &'a str,
}

#[derive(Serialize)]
struct UserRequest<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct SessionChatRequest<'a> {
    user_id: &'a str,
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: Option<String>,
    action: Option<String>,
    connect_url: Option<String>,
}

#[derive(Deserialize)]
struct SessionsLogResponse {
    sessions: Vec<SessionEntry>,
}

#[derive(Deserialize)]
struct SessionChatResponse {
    chat: Vec<HistoryTurn>,
}

/// reqwest-backed implementation against the AdukiChatAgent server.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> HttpBackend {
        HttpBackend::new(config::backend_url())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(
        &self,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<ChatOutcome, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/chat"))
            .json(&ChatRequest {
                message,
                user_id,
                session_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        if let Some(reply) = response.reply {
            return Ok(ChatOutcome::Reply(reply));
        }
        match (response.action.as_deref(), response.connect_url) {
            (Some("connect_google"), Some(raw_url)) => {
                let connect_url = Url::parse(&raw_url)
                    .map_err(|e| ClientError::Protocol(format!("bad connect_url: {}", e)))?;
                Ok(ChatOutcome::ConnectGoogle { connect_url })
            }
            _ => Err(ClientError::Protocol(
                "chat response carried neither a reply nor a known action".to_string(),
            )),
        }
    }

    async fn sessions_log(&self, user_id: &str) -> Result<Vec<SessionEntry>, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/sessions-log"))
            .json(&UserRequest { user_id })
            .send()
            .await?
            .error_for_status()?
            .json::<SessionsLogResponse>()
            .await?;
        Ok(response.sessions)
    }

    async fn session_chat(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<HistoryTurn>, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/session_chat"))
            .json(&SessionChatRequest {
                user_id,
                session_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<SessionChatResponse>()
            .await?;
        Ok(response.chat)
    }
}
