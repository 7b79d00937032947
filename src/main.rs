use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use AdukiChatClient::config;
use AdukiChatClient::models::payload::format_email_list;
use AdukiChatClient::services::backend::HttpBackend;
use AdukiChatClient::services::controller::{ConversationController, SubmitOutcome};
use AdukiChatClient::services::voice_orchestrator::NullSpeechPlatform;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_logging();

    let backend = Arc::new(HttpBackend::from_env());
    let controller = ConversationController::new(
        backend,
        Arc::new(NullSpeechPlatform),
        config::user_id(),
    );

    if let Err(e) = controller.refresh_sessions().await {
        log::warn!("Initial session list fetch failed: {}", e);
    }
    let _poller = controller.start_session_list_poller(config::session_list_poll_interval());

    println!("Aduki chat client. /sessions /switch <id> /new /select <threadId> <from> /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if line == "/sessions" {
            for entry in controller.sessions() {
                println!("  {}  ({})", entry.display_name(), entry.session_id);
            }
            continue;
        }
        if line == "/new" {
            let session_id = controller.new_session();
            println!("Started session {}", session_id);
            continue;
        }
        if let Some(session_id) = line.strip_prefix("/switch ") {
            let session = controller.switch_session(session_id.trim()).await;
            println!("Switched to {} ({} turns)", session.session_id, session.turns.len());
            continue;
        }
        if let Some(rest) = line.strip_prefix("/select ") {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(thread_id), Some(from)) => {
                    if controller.select_email(thread_id, from) {
                        println!("Next message will reply to {}", from);
                    } else {
                        println!("No such email in the active list");
                    }
                }
                _ => println!("Usage: /select <threadId> <from>"),
            }
            continue;
        }

        match controller.submit(line).await {
            Ok(SubmitOutcome::Replied(turn)) => match turn.payload {
                Some(payload) => {
                    if let Some(items) = payload.as_email_list() {
                        println!("{}", format_email_list(items));
                    }
                }
                None => println!("{}", turn.text),
            },
            Ok(SubmitOutcome::ConnectGoogle(url)) => {
                println!("Connect your Google account first: {}", url);
            }
            Ok(SubmitOutcome::Discarded) => {}
            Err(e) => println!("(request failed: {})", e),
        }
    }

    Ok(())
}
