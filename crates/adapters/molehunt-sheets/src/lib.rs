pub mod client;
pub mod config;
mod wire;

pub use client::ScriptClient;
pub use config::SheetsConfig;
