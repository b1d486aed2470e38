use std::time::Duration;

use tokio::sync::mpsc;

use molehunt_core::notify::{CoinNotification, NotificationDedup};
use molehunt_core::service::{RemoteService, RequestStatus, ServiceResult};

/// Check once for coin-request activity involving `username`.
///
/// Only the first pending incoming request is considered per poll; every
/// accepted outgoing request is. Anything `dedup` has already admitted is
/// skipped. A failed incoming fetch is an error; a failed outgoing fetch is
/// logged and the incoming notification is still returned, since `dedup` has
/// already recorded it.
pub async fn poll_once<B: RemoteService>(
    backend: &B,
    username: &str,
    dedup: &mut NotificationDedup,
) -> ServiceResult<Vec<CoinNotification>> {
    let mut out = Vec::new();

    let incoming = backend.get_coin_requests(username).await?;
    if let Some(request) = incoming.into_iter().next()
        && dedup.admit(&request.from_user, &request.timestamp)
    {
        out.push(CoinNotification::IncomingRequest(request));
    }

    let outgoing = match backend.get_user_coin_requests(username).await {
        Ok(outgoing) => outgoing,
        Err(e) => {
            tracing::warn!(username, error = %e, "Failed to fetch outgoing coin requests");
            return Ok(out);
        },
    };
    for request in outgoing {
        if request.status == RequestStatus::Accepted
            && dedup.admit(&request.to_user, &request.timestamp)
        {
            out.push(CoinNotification::RequestAccepted {
                by: request.to_user,
                timestamp: request.timestamp,
            });
        }
    }

    Ok(out)
}

/// Periodic coin-request monitor for one logged-in player.
pub struct CoinRequestPoller<B> {
    backend: B,
    username: String,
    interval: Duration,
    dedup: NotificationDedup,
}

impl<B: RemoteService> CoinRequestPoller<B> {
    pub fn new(backend: B, username: impl Into<String>, interval: Duration) -> Self {
        Self {
            backend,
            username: username.into(),
            interval,
            dedup: NotificationDedup::new(),
        }
    }

    /// Run the poller loop, sending notifications through the channel.
    ///
    /// The first poll happens one interval after start. Returns when the
    /// receiver is dropped.
    pub async fn run<T: From<CoinNotification>>(mut self, tx: mpsc::UnboundedSender<T>) {
        loop {
            tokio::time::sleep(self.interval).await;
            if tx.is_closed() {
                return;
            }
            match poll_once(&self.backend, &self.username, &mut self.dedup).await {
                Ok(notifications) => {
                    for notification in notifications {
                        tracing::debug!(?notification, "Coin request notification");
                        if tx.send(notification.into()).is_err() {
                            return;
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!(username = %self.username, error = %e, "Failed to poll coin requests");
                },
            }
        }
    }
}
