pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::ClientError;
pub use models::payload::{EmailItem, StructuredPayload};
pub use models::turn::{Role, Session, Turn};
pub use models::voice::VoiceState;
