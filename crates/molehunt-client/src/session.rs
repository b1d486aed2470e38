//! Player session: login, coin balance, round lifecycle and coin requests.
//!
//! A [`Session`] owns at most one logged-in player. Each login gets a fresh
//! [`RoundEngine`] on a [`TokioScheduler`] plus a background
//! [`CoinRequestPoller`]; logging out drops both.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use molehunt_core::config::ConfigError;
use molehunt_core::notify::CoinNotification;
use molehunt_core::observer::{NoopObserver, RoundObserver};
use molehunt_core::round::{HitOutcome, RoundEngine, RoundPhase, RoundResult, StartRefused};
use molehunt_core::scheduler::TimerToken;
use molehunt_core::service::{
    CoinResponse, GameRecord, IncomingCoinRequest, NewCoinRequest, RemoteService, ServiceError,
};
use molehunt_core::target::SlotIndex;
use molehunt_core::time::timestamp_now;

use crate::config::ClientConfig;
use crate::driver::TokioScheduler;
use crate::poller::CoinRequestPoller;
use crate::ranking::{RankedPlayer, leaderboard};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("wrong username or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Start(#[from] StartRefused),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Background results delivered to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Coin(CoinNotification),
    /// A finished round was stored by the service.
    RoundSaved(GameRecord),
    /// Leaderboard refreshed after a round.
    Ranking(Vec<RankedPlayer>),
}

impl From<CoinNotification> for SessionUpdate {
    fn from(notification: CoinNotification) -> Self {
        Self::Coin(notification)
    }
}

pub type PlayerEngine<O> = RoundEngine<TokioScheduler, O>;

struct Player<O> {
    username: String,
    password: String,
    coins: u32,
    engine: PlayerEngine<O>,
    timers: mpsc::UnboundedReceiver<TimerToken>,
    poller: JoinHandle<()>,
}

impl<O> Drop for Player<O> {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

pub struct Session<B, O = NoopObserver> {
    backend: B,
    config: ClientConfig,
    /// Cloned into each new engine.
    observer: O,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    player: Option<Player<O>>,
}

fn valid_password(password: &str) -> bool {
    password.len() == 4 && password.bytes().all(|b| b.is_ascii_digit())
}

impl<B, O> Session<B, O>
where
    B: RemoteService + Clone,
    O: RoundObserver + Clone,
{
    /// Create a logged-out session and the receiver for its background updates.
    pub fn new(
        backend: B,
        config: ClientConfig,
        observer: O,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let session = Self {
            backend,
            config,
            observer,
            updates,
            player: None,
        };
        (session, rx)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_logged_in(&self) -> bool {
        self.player.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.player.as_ref().map(|p| p.username.as_str())
    }

    pub fn coins(&self) -> Option<u32> {
        self.player.as_ref().map(|p| p.coins)
    }

    pub fn engine(&self) -> Option<&PlayerEngine<O>> {
        self.player.as_ref().map(|p| &p.engine)
    }

    /// Log in, replacing any current player. Returns the coin balance.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<u32, SessionError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::InvalidInput("username and password are required"));
        }
        if !valid_password(password) {
            return Err(SessionError::InvalidInput("password must be exactly 4 digits"));
        }

        let user = self
            .backend
            .get_user(username, password)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        self.logout();
        let coins = user.coins.unwrap_or(self.config.session.initial_coins);
        let (scheduler, timers) = TokioScheduler::new();
        let engine = RoundEngine::new(
            self.config.round.clone(),
            scheduler,
            self.observer.clone(),
        )?;
        let poller = CoinRequestPoller::new(
            self.backend.clone(),
            user.username.as_str(),
            self.config.session.poll_interval(),
        );
        let poller = tokio::spawn(poller.run(self.updates.clone()));

        tracing::info!(username = %user.username, coins, "Logged in");
        self.player = Some(Player {
            username: user.username,
            password: password.to_string(),
            coins,
            engine,
            timers,
            poller,
        });
        Ok(coins)
    }

    /// Pay the entry cost and start a round.
    pub fn start_round(&mut self) -> Result<(), SessionError> {
        let player = self.player.as_mut().ok_or(SessionError::NotLoggedIn)?;
        player.coins = player.engine.start(player.coins)?;
        Ok(())
    }

    /// Hit a slot, crediting any coins the hit awards.
    pub fn hit(&mut self, slot: SlotIndex) -> Option<HitOutcome> {
        let player = self.player.as_mut()?;
        let outcome = player.engine.hit(slot)?;
        player.coins = player.coins.saturating_add(outcome.coins_awarded);
        Some(outcome)
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.player
            .as_mut()
            .is_some_and(|p| p.engine.toggle_pause())
    }

    /// Leave the round screen.
    ///
    /// With a round in progress this only goes through when `confirmed`, in
    /// which case the round ends and is saved. Returns whether the player is
    /// back at the menu.
    pub fn back_to_menu(&mut self, confirmed: bool) -> bool {
        let Some(player) = self.player.as_mut() else {
            return true;
        };
        if !matches!(
            player.engine.phase(),
            RoundPhase::Running | RoundPhase::Paused
        ) {
            return true;
        }
        if !confirmed {
            return false;
        }
        if let Some(result) = player.engine.end_round() {
            self.finish_round(&result);
        }
        true
    }

    /// Wait for the next engine timer. Pends forever while logged out.
    pub async fn next_timer(&mut self) -> Option<TimerToken> {
        match self.player.as_mut() {
            Some(player) => player.timers.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Feed a fired timer to the engine. Returns the result if the round ended.
    pub fn fire(&mut self, token: TimerToken) -> Option<RoundResult> {
        let result = self.player.as_mut()?.engine.on_timer(token)?;
        self.finish_round(&result);
        Some(result)
    }

    /// Save the round and refresh the leaderboard in the background.
    fn finish_round(&self, result: &RoundResult) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let record = GameRecord::from_result(&player.username, result);
        let backend = self.backend.clone();
        let updates = self.updates.clone();
        let limit = self.config.session.ranking_limit;

        tokio::spawn(async move {
            match backend.save_game(record.clone()).await {
                Ok(()) => {
                    tracing::info!(username = %record.username, score = record.score, "Game saved");
                    let _ = updates.send(SessionUpdate::RoundSaved(record));
                },
                Err(e) => {
                    tracing::warn!(username = %record.username, error = %e, "Failed to save game");
                },
            }
            match backend.get_ranking().await {
                Ok(entries) => {
                    let _ = updates.send(SessionUpdate::Ranking(leaderboard(entries, limit)));
                },
                Err(e) => tracing::warn!(error = %e, "Failed to refresh ranking"),
            }
        });
    }

    pub async fn ranking(&self) -> Result<Vec<RankedPlayer>, SessionError> {
        let entries = self.backend.get_ranking().await?;
        Ok(leaderboard(entries, self.config.session.ranking_limit))
    }

    /// Ask another player for coins.
    pub async fn send_coin_request(&self, to: &str, message: &str) -> Result<(), SessionError> {
        let player = self.player.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let to = to.trim();
        let message = message.trim();
        if to.is_empty() || message.is_empty() {
            return Err(SessionError::InvalidInput("recipient and message are required"));
        }
        if to == player.username {
            return Err(SessionError::InvalidInput("cannot request coins from yourself"));
        }

        let request = NewCoinRequest {
            from_user: player.username.clone(),
            to_user: to.to_string(),
            message: message.to_string(),
            timestamp: timestamp_now(),
        };
        self.backend.coin_request(request).await?;
        tracing::info!(from = %player.username, to, "Coin request sent");
        Ok(())
    }

    /// Accept or reject an incoming request. Accepting refreshes the balance;
    /// either answer pushes a fresh leaderboard through the update channel.
    pub async fn respond_to_coin_request(
        &mut self,
        request: &IncomingCoinRequest,
        response: CoinResponse,
    ) -> Result<(), SessionError> {
        if self.player.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        let id = request
            .id
            .ok_or(SessionError::InvalidInput("coin request has no row id"))?;
        self.backend.coin_respond(id, response).await?;
        tracing::info!(from = %request.from_user, response = response.as_str(), "Answered coin request");

        if response == CoinResponse::Accepted
            && let Err(e) = self.refresh_coins().await
        {
            tracing::warn!(error = %e, "Failed to refresh coins");
        }
        match self.ranking().await {
            Ok(board) => {
                let _ = self.updates.send(SessionUpdate::Ranking(board));
            },
            Err(e) => tracing::warn!(error = %e, "Failed to refresh ranking"),
        }
        Ok(())
    }

    /// Re-read the balance from the service with the stored credentials.
    pub async fn refresh_coins(&mut self) -> Result<u32, SessionError> {
        let player = self.player.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let user = self
            .backend
            .get_user(&player.username, &player.password)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        let player = self.player.as_mut().ok_or(SessionError::NotLoggedIn)?;
        if let Some(coins) = user.coins {
            player.coins = coins;
        }
        Ok(player.coins)
    }

    /// React to a poller notification. Accepted requests refresh the balance.
    pub async fn handle_notification(&mut self, notification: &CoinNotification) {
        if let CoinNotification::RequestAccepted { by, .. } = notification {
            tracing::info!(by = %by, "Coin request accepted");
            if let Err(e) = self.refresh_coins().await {
                tracing::warn!(error = %e, "Failed to refresh coins");
            }
        }
    }

    /// Drop the player, its engine timers and its poller.
    pub fn logout(&mut self) {
        if let Some(player) = self.player.take() {
            tracing::info!(username = %player.username, "Logged out");
        }
    }
}
