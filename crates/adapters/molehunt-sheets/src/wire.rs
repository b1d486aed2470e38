//! JSON shapes spoken by the script endpoint, and their mapping to core records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use molehunt_core::service::{
    CoinResponse, GameRecord, IncomingCoinRequest, NewCoinRequest, OutgoingCoinRequest,
    RankingEntry, RequestStatus, UserRecord,
};
use molehunt_core::time::format_timestamp;

/// Error string `getUser` returns for a bad password.
pub(crate) const WRONG_PASSWORD: &str = "wrong password";

/// Sheet cells come back as numbers or numeric strings; blanks count as missing.
fn count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Timestamps are kept verbatim because they double as dedup keys.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    username: String,
    #[serde(default)]
    coins: Option<Value>,
}

impl From<WireUser> for UserRecord {
    fn from(user: WireUser) -> Self {
        Self {
            coins: count(user.coins.as_ref()).map(|c| c.min(u32::MAX as u64) as u32),
            username: user.username,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRankingRow {
    username: String,
    #[serde(default)]
    total_score: Option<Value>,
    #[serde(default)]
    golden_moles_hit: Option<Value>,
    #[serde(default)]
    games_played: Option<Value>,
}

impl From<WireRankingRow> for RankingEntry {
    fn from(row: WireRankingRow) -> Self {
        Self {
            total_score: count(row.total_score.as_ref()).unwrap_or(0),
            bonus_hits: count(row.golden_moles_hit.as_ref()).unwrap_or(0),
            games_played: count(row.games_played.as_ref()).unwrap_or(0),
            username: row.username,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireIncomingRequest {
    #[serde(default)]
    row: Option<Value>,
    from_user: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    timestamp: Value,
}

impl From<WireIncomingRequest> for IncomingCoinRequest {
    fn from(req: WireIncomingRequest) -> Self {
        Self {
            id: count(req.row.as_ref()),
            from_user: req.from_user,
            message: req.message,
            timestamp: text(&req.timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOutgoingRequest {
    to_user: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    timestamp: Value,
}

impl WireOutgoingRequest {
    /// Rows with a status we do not understand are dropped.
    pub(crate) fn into_record(self) -> Option<OutgoingCoinRequest> {
        let Some(status) = RequestStatus::parse(&self.status) else {
            tracing::debug!(status = %self.status, "Skipping coin request with unknown status");
            return None;
        };
        Some(OutgoingCoinRequest {
            to_user: self.to_user,
            status,
            timestamp: text(&self.timestamp),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGame<'a> {
    username: &'a str,
    score: u32,
    golden_moles_hit: u32,
    duration: u64,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireNewRequest<'a> {
    from_user: &'a str,
    to_user: &'a str,
    message: &'a str,
    status: &'static str,
    timestamp: String,
}

/// Body of a POST to the endpoint.
#[derive(Debug, Serialize)]
#[serde(tag = "action")]
pub(crate) enum WriteBody<'a> {
    #[serde(rename = "saveGame")]
    SaveGame { game: WireGame<'a> },
    #[serde(rename = "coinRequest")]
    CoinRequest { request: WireNewRequest<'a> },
    #[serde(rename = "coinRespond")]
    CoinRespond {
        #[serde(rename = "requestId")]
        request_id: u64,
        response: &'static str,
    },
}

impl<'a> WriteBody<'a> {
    pub(crate) fn save_game(game: &'a GameRecord) -> Self {
        Self::SaveGame {
            game: WireGame {
                username: &game.username,
                score: game.score,
                golden_moles_hit: game.bonus_hits,
                duration: game.duration_secs,
                timestamp: format_timestamp(game.timestamp),
            },
        }
    }

    pub(crate) fn coin_request(request: &'a NewCoinRequest) -> Self {
        Self::CoinRequest {
            request: WireNewRequest {
                from_user: &request.from_user,
                to_user: &request.to_user,
                message: &request.message,
                status: RequestStatus::Pending.as_str(),
                timestamp: format_timestamp(request.timestamp),
            },
        }
    }

    pub(crate) fn coin_respond(request_id: u64, response: CoinResponse) -> Self {
        Self::CoinRespond {
            request_id,
            response: response.as_str(),
        }
    }
}

/// Pull `{"error": "..."}` out of a response, if present.
pub(crate) fn remote_error(value: &Value) -> Option<String> {
    value.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
