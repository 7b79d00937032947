use std::env;
use std::time::Duration;

pub fn init_logging() {
    // Pick up a .env file if one is present (dev convenience).
    let _ = dotenv::dotenv();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

pub fn backend_url() -> String {
    env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
}

pub const SESSION_LIST_POLL_SECS: u64 = 30;

pub fn session_list_poll_interval() -> Duration {
    Duration::from_secs(SESSION_LIST_POLL_SECS)
}

const DEFAULT_USER_ID: &str = "local-user";

pub fn user_id() -> String {
    env::var("CHAT_USER_ID").unwrap_or_else(|_| DEFAULT_USER_ID.to_string())
}
