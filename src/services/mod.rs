pub mod backend;
pub mod controller;
pub mod payload_parser;
pub mod session_store;
pub mod voice_orchestrator;
