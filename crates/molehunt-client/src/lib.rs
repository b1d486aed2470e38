pub mod command;
pub mod config;
pub mod driver;
pub mod poller;
pub mod ranking;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, SessionConfig};
pub use session::{Session, SessionError, SessionUpdate};
