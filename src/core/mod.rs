pub mod access_code;
pub mod app;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod preferences;
pub mod session;
pub mod session_store;
pub mod storage;
