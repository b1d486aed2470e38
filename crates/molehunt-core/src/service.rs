//! Contract with the remote data service (users, game history, ranking, coin requests).
//!
//! The engine only ever produces a [`GameRecord`]; everything else here is
//! consumed by the session layer.

use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::round::RoundResult;

/// A failed call to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("service error: {0}")]
    Remote(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A user as returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Server-side balance. Absent for accounts created before coins existed.
    pub coins: Option<u32>,
}

/// One finished round, as persisted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub username: String,
    pub score: u32,
    pub bonus_hits: u32,
    pub duration_secs: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl GameRecord {
    pub fn from_result(username: &str, result: &RoundResult) -> Self {
        Self {
            username: username.to_string(),
            score: result.score,
            bonus_hits: result.bonus_hits,
            duration_secs: result.duration_secs,
            timestamp: result.ended_at,
        }
    }
}

/// Aggregated stats for one player, ordered best-first by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub username: String,
    pub total_score: u64,
    pub bonus_hits: u64,
    pub games_played: u64,
}

/// A pending request from another player asking us for coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCoinRequest {
    /// Service-side row id used to answer the request.
    pub id: Option<u64>,
    pub from_user: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// A request we sent, with its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingCoinRequest {
    pub to_user: String,
    pub status: RequestStatus,
    pub timestamp: String,
}

/// A new coin request to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCoinRequest {
    pub from_user: String,
    pub to_user: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Answer to an incoming coin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinResponse {
    Accepted,
    Rejected,
}

impl CoinResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Remote procedures the game relies on.
///
/// Futures are `Send` so calls can run on spawned tasks without blocking
/// round timing.
pub trait RemoteService: Send + Sync + 'static {
    /// Look up a user. `Ok(None)` means the password was wrong.
    fn get_user(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = ServiceResult<Option<UserRecord>>> + Send;

    fn save_game(&self, game: GameRecord) -> impl Future<Output = ServiceResult<()>> + Send;

    fn get_ranking(&self) -> impl Future<Output = ServiceResult<Vec<RankingEntry>>> + Send;

    /// Pending requests addressed to `username`.
    fn get_coin_requests(
        &self,
        username: &str,
    ) -> impl Future<Output = ServiceResult<Vec<IncomingCoinRequest>>> + Send;

    /// Requests sent by `username`, with their status.
    fn get_user_coin_requests(
        &self,
        username: &str,
    ) -> impl Future<Output = ServiceResult<Vec<OutgoingCoinRequest>>> + Send;

    fn coin_request(&self, request: NewCoinRequest)
    -> impl Future<Output = ServiceResult<()>> + Send;

    fn coin_respond(
        &self,
        request_id: u64,
        response: CoinResponse,
    ) -> impl Future<Output = ServiceResult<()>> + Send;
}
