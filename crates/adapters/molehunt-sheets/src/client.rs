use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use molehunt_core::service::{
    CoinResponse, GameRecord, IncomingCoinRequest, NewCoinRequest, OutgoingCoinRequest,
    RankingEntry, RemoteService, ServiceError, ServiceResult, UserRecord,
};

use crate::config::SheetsConfig;
use crate::wire::{
    WRONG_PASSWORD, WireIncomingRequest, WireOutgoingRequest, WireRankingRow, WireUser,
    WriteBody, remote_error,
};

/// Client for the spreadsheet script endpoint.
///
/// Reads are `GET ?action=...` queries, writes are JSON `POST`s tagged with
/// an `action` field. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ScriptClient {
    client: reqwest::Client,
    base_url: String,
}

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(e.to_string())
}

fn decode<T: DeserializeOwned>(value: Value) -> ServiceResult<T> {
    serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

impl ScriptClient {
    pub fn new(config: &SheetsConfig) -> ServiceResult<Self> {
        if config.base_url.is_empty() {
            return Err(ServiceError::Transport("script URL is not configured".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read(&self, action: &str, params: &[(&str, &str)]) -> ServiceResult<Value> {
        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("action", action));
        query.extend_from_slice(params);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(ServiceError::Status(resp.status().as_u16()));
        }
        let value: Value = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        if let Some(message) = remote_error(&value) {
            return Err(ServiceError::Remote(message));
        }
        Ok(value)
    }

    /// Writes only need an acknowledgement; a non-JSON body counts as success.
    async fn write(&self, body: &WriteBody<'_>) -> ServiceResult<()> {
        let resp = self
            .client
            .post(&self.base_url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(ServiceError::Status(resp.status().as_u16()));
        }
        let text = resp.text().await.map_err(transport)?;
        if let Ok(value) = serde_json::from_str::<Value>(&text)
            && let Some(message) = remote_error(&value)
        {
            return Err(ServiceError::Remote(message));
        }
        Ok(())
    }

    async fn read_list<W: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> ServiceResult<Vec<W>> {
        match self.read(action, params).await? {
            Value::Null => Ok(Vec::new()),
            value => decode(value),
        }
    }
}

impl RemoteService for ScriptClient {
    async fn get_user(&self, username: &str, password: &str) -> ServiceResult<Option<UserRecord>> {
        let params = [("username", username), ("password", password)];
        match self.read("getUser", &params).await {
            Ok(value) => decode::<WireUser>(value).map(|u| Some(u.into())),
            Err(ServiceError::Remote(message)) if message == WRONG_PASSWORD => {
                tracing::debug!(username, "Login rejected: wrong password");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    async fn save_game(&self, game: GameRecord) -> ServiceResult<()> {
        tracing::debug!(username = %game.username, score = game.score, "Saving game");
        self.write(&WriteBody::save_game(&game)).await
    }

    async fn get_ranking(&self) -> ServiceResult<Vec<RankingEntry>> {
        let rows: Vec<WireRankingRow> = self.read_list("getRanking", &[]).await?;
        Ok(rows.into_iter().map(RankingEntry::from).collect())
    }

    async fn get_coin_requests(&self, username: &str) -> ServiceResult<Vec<IncomingCoinRequest>> {
        let rows: Vec<WireIncomingRequest> = self
            .read_list("getCoinRequests", &[("username", username)])
            .await?;
        Ok(rows.into_iter().map(IncomingCoinRequest::from).collect())
    }

    async fn get_user_coin_requests(
        &self,
        username: &str,
    ) -> ServiceResult<Vec<OutgoingCoinRequest>> {
        let rows: Vec<WireOutgoingRequest> = self
            .read_list("getUserCoinRequests", &[("username", username)])
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(WireOutgoingRequest::into_record)
            .collect())
    }

    async fn coin_request(&self, request: NewCoinRequest) -> ServiceResult<()> {
        tracing::debug!(from = %request.from_user, to = %request.to_user, "Sending coin request");
        self.write(&WriteBody::coin_request(&request)).await
    }

    async fn coin_respond(&self, request_id: u64, response: CoinResponse) -> ServiceResult<()> {
        tracing::debug!(request_id, response = response.as_str(), "Answering coin request");
        self.write(&WriteBody::coin_respond(request_id, response))
            .await
    }
}
