//! In-memory [`RemoteService`] for session and poller tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use molehunt_core::service::{
    CoinResponse, GameRecord, IncomingCoinRequest, NewCoinRequest, OutgoingCoinRequest,
    RankingEntry, RemoteService, ServiceError, ServiceResult, UserRecord,
};

#[derive(Default)]
struct FakeState {
    users: HashMap<String, (String, Option<u32>)>,
    incoming: Vec<IncomingCoinRequest>,
    outgoing: Vec<OutgoingCoinRequest>,
    ranking: Vec<RankingEntry>,
    saved: Vec<GameRecord>,
    sent: Vec<NewCoinRequest>,
    responses: Vec<(u64, CoinResponse)>,
    fail_reads: bool,
    fail_writes: bool,
    fail_outgoing: bool,
    get_user_calls: usize,
    save_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_user(&self, username: &str, password: &str, coins: Option<u32>) {
        self.with(|s| {
            s.users
                .insert(username.to_string(), (password.to_string(), coins))
        });
    }

    pub fn set_coins(&self, username: &str, coins: Option<u32>) {
        self.with(|s| {
            if let Some(user) = s.users.get_mut(username) {
                user.1 = coins;
            }
        });
    }

    pub fn set_incoming(&self, requests: Vec<IncomingCoinRequest>) {
        self.with(|s| s.incoming = requests);
    }

    pub fn set_outgoing(&self, requests: Vec<OutgoingCoinRequest>) {
        self.with(|s| s.outgoing = requests);
    }

    /// Fill the ranking with `n` players, best first.
    pub fn set_ranking(&self, n: u64) {
        let ranking = (0..n)
            .map(|i| RankingEntry {
                username: format!("player{i}"),
                total_score: (n - i) * 10,
                bonus_hits: 0,
                games_played: 1,
            })
            .collect();
        self.with(|s| s.ranking = ranking);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.with(|s| s.fail_reads = fail);
    }

    /// Fail only `get_user_coin_requests`.
    pub fn fail_outgoing(&self, fail: bool) {
        self.with(|s| s.fail_outgoing = fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.with(|s| s.fail_writes = fail);
    }

    pub fn get_user_calls(&self) -> usize {
        self.with(|s| s.get_user_calls)
    }

    pub fn save_calls(&self) -> usize {
        self.with(|s| s.save_calls)
    }

    pub fn saved(&self) -> Vec<GameRecord> {
        self.with(|s| s.saved.clone())
    }

    pub fn sent(&self) -> Vec<NewCoinRequest> {
        self.with(|s| s.sent.clone())
    }

    pub fn responses(&self) -> Vec<(u64, CoinResponse)> {
        self.with(|s| s.responses.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> ServiceResult<T> {
        self.with(|s| {
            if s.fail_reads {
                return Err(ServiceError::Transport("connection refused".to_string()));
            }
            Ok(f(s))
        })
    }

    fn write(&self, f: impl FnOnce(&mut FakeState)) -> ServiceResult<()> {
        self.with(|s| {
            if s.fail_writes {
                return Err(ServiceError::Status(500));
            }
            f(s);
            Ok(())
        })
    }
}

impl RemoteService for FakeBackend {
    async fn get_user(&self, username: &str, password: &str) -> ServiceResult<Option<UserRecord>> {
        self.with(|s| s.get_user_calls += 1);
        self.read(|s| {
            s.users
                .get(username)
                .filter(|(stored, _)| stored == password)
                .map(|(_, coins)| UserRecord {
                    username: username.to_string(),
                    coins: *coins,
                })
        })
    }

    async fn save_game(&self, game: GameRecord) -> ServiceResult<()> {
        self.with(|s| s.save_calls += 1);
        self.write(|s| s.saved.push(game))
    }

    async fn get_ranking(&self) -> ServiceResult<Vec<RankingEntry>> {
        self.read(|s| s.ranking.clone())
    }

    async fn get_coin_requests(&self, _username: &str) -> ServiceResult<Vec<IncomingCoinRequest>> {
        self.read(|s| s.incoming.clone())
    }

    async fn get_user_coin_requests(
        &self,
        _username: &str,
    ) -> ServiceResult<Vec<OutgoingCoinRequest>> {
        if self.with(|s| s.fail_outgoing) {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }
        self.read(|s| s.outgoing.clone())
    }

    async fn coin_request(&self, request: NewCoinRequest) -> ServiceResult<()> {
        self.write(|s| s.sent.push(request))
    }

    async fn coin_respond(&self, request_id: u64, response: CoinResponse) -> ServiceResult<()> {
        self.write(|s| s.responses.push((request_id, response)))
    }
}
