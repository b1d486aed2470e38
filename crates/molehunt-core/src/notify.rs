use std::collections::HashSet;

use crate::service::IncomingCoinRequest;

/// Something the coin-request poller wants the player to see.
#[derive(Debug, Clone, PartialEq)]
pub enum CoinNotification {
    /// Another player asked us for coins.
    IncomingRequest(IncomingCoinRequest),
    /// A player accepted one of our requests.
    RequestAccepted { by: String, timestamp: String },
}

/// Remembers which notifications were already surfaced.
///
/// Keyed by counterpart username and request timestamp, so repeated polling
/// never alerts twice for the same event.
#[derive(Debug, Default, Clone)]
pub struct NotificationDedup {
    seen: HashSet<String>,
}

impl NotificationDedup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(counterpart: &str, timestamp: &str) -> String {
        format!("{counterpart}-{timestamp}")
    }

    /// Returns true the first time a key is seen.
    pub fn admit(&mut self, counterpart: &str, timestamp: &str) -> bool {
        self.seen.insert(Self::key(counterpart, timestamp))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
