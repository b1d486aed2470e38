use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use time::macros::datetime;

use molehunt_core::service::{
    CoinResponse, GameRecord, NewCoinRequest, RemoteService, RequestStatus, ServiceError,
};
use molehunt_sheets::{ScriptClient, SheetsConfig};

type Posted = Arc<Mutex<Vec<Value>>>;

/// In-process stand-in for the deployed script.
struct FakeScript {
    addr: SocketAddr,
    posted: Posted,
    _shutdown: tokio::task::JoinHandle<()>,
}

async fn script_get(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let action = params.get("action").map(String::as_str).unwrap_or_default();
    let body = match action {
        "getUser" => match params.get("password").map(String::as_str) {
            Some("1234") => json!({"username": params["username"], "coins": 7}),
            Some("0000") => json!({"username": params["username"]}),
            _ => json!({"error": "wrong password"}),
        },
        "getRanking" => json!([
            {"username": "alice", "totalScore": 120, "goldenMolesHit": 4, "gamesPlayed": 6},
            {"username": "bob", "totalScore": "90", "goldenMolesHit": 1, "gamesPlayed": 3}
        ]),
        "getCoinRequests" => json!([
            {"row": 3, "fromUser": "carol", "message": "spare one?", "timestamp": "2026-01-01T10:00:00.000Z"}
        ]),
        "getUserCoinRequests" => json!([
            {"toUser": "dave", "status": "accepted", "timestamp": "2026-01-01T11:00:00.000Z"},
            {"toUser": "erin", "status": "pending", "timestamp": "2026-01-01T11:05:00.000Z"},
            {"toUser": "frank", "status": "misplaced", "timestamp": "2026-01-01T11:10:00.000Z"}
        ]),
        _ => json!({"error": format!("unknown action {action}")}),
    };
    Json(body)
}

async fn script_post(State(posted): State<Posted>, Json(body): Json<Value>) -> String {
    posted.lock().unwrap().push(body);
    "ok".to_string()
}

async fn rejecting_post() -> Json<Value> {
    Json(json!({"error": "request row not found"}))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

impl FakeScript {
    async fn start() -> Self {
        let posted: Posted = Arc::default();
        let app = Router::new()
            .route("/exec", get(script_get).post(script_post))
            .route("/rejecting", get(script_get).post(rejecting_post))
            .route("/broken", get(broken).post(broken))
            .with_state(Arc::clone(&posted));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            posted,
            _shutdown: handle,
        }
    }

    fn client(&self, path: &str) -> ScriptClient {
        let config = SheetsConfig {
            base_url: format!("http://{}{path}", self.addr),
            ..SheetsConfig::default()
        };
        ScriptClient::new(&config).unwrap()
    }

    fn posted(&self) -> Vec<Value> {
        self.posted.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn login_returns_user_with_coins() {
    let script = FakeScript::start().await;
    let user = script
        .client("/exec")
        .get_user("alice", "1234")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.coins, Some(7));
}

#[tokio::test]
async fn login_without_coin_column() {
    let script = FakeScript::start().await;
    let user = script
        .client("/exec")
        .get_user("alice", "0000")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.coins, None);
}

#[tokio::test]
async fn wrong_password_is_not_an_error() {
    let script = FakeScript::start().await;
    let user = script
        .client("/exec")
        .get_user("alice", "9999")
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn ranking_rows_decode() {
    let script = FakeScript::start().await;
    let ranking = script.client("/exec").get_ranking().await.unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].username, "alice");
    assert_eq!(ranking[0].total_score, 120);
    assert_eq!(ranking[0].bonus_hits, 4);
    assert_eq!(ranking[1].total_score, 90);
    assert_eq!(ranking[1].games_played, 3);
}

#[tokio::test]
async fn incoming_coin_requests_decode() {
    let script = FakeScript::start().await;
    let requests = script
        .client("/exec")
        .get_coin_requests("alice")
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, Some(3));
    assert_eq!(requests[0].from_user, "carol");
    assert_eq!(requests[0].message, "spare one?");
}

#[tokio::test]
async fn outgoing_requests_skip_unknown_status() {
    let script = FakeScript::start().await;
    let requests = script
        .client("/exec")
        .get_user_coin_requests("alice")
        .await
        .unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].to_user, "dave");
    assert_eq!(requests[0].status, RequestStatus::Accepted);
    assert_eq!(requests[1].status, RequestStatus::Pending);
}

#[tokio::test]
async fn save_game_posts_tagged_body() {
    let script = FakeScript::start().await;
    let game = GameRecord {
        username: "alice".to_string(),
        score: 23,
        bonus_hits: 2,
        duration_secs: 30,
        timestamp: datetime!(2026-03-01 09:30:00 UTC),
    };
    script.client("/exec").save_game(game).await.unwrap();

    let posted = script.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["action"], "saveGame");
    assert_eq!(posted[0]["game"]["username"], "alice");
    assert_eq!(posted[0]["game"]["score"], 23);
    assert_eq!(posted[0]["game"]["goldenMolesHit"], 2);
    assert_eq!(posted[0]["game"]["duration"], 30);
}

#[tokio::test]
async fn coin_request_and_response_post() {
    let script = FakeScript::start().await;
    let client = script.client("/exec");
    client
        .coin_request(NewCoinRequest {
            from_user: "alice".to_string(),
            to_user: "bob".to_string(),
            message: "help".to_string(),
            timestamp: datetime!(2026-03-01 09:30:00 UTC),
        })
        .await
        .unwrap();
    client
        .coin_respond(3, CoinResponse::Accepted)
        .await
        .unwrap();

    let posted = script.posted();
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[0]["action"], "coinRequest");
    assert_eq!(posted[0]["request"]["status"], "pending");
    assert_eq!(posted[1], json!({"action": "coinRespond", "requestId": 3, "response": "accepted"}));
}

#[tokio::test]
async fn write_error_object_is_remote_error() {
    let script = FakeScript::start().await;
    let err = script
        .client("/rejecting")
        .coin_respond(3, CoinResponse::Rejected)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Remote("request row not found".to_string()));
}

#[tokio::test]
async fn http_failure_maps_to_status() {
    let script = FakeScript::start().await;
    let client = script.client("/broken");
    assert_eq!(
        client.get_ranking().await.unwrap_err(),
        ServiceError::Status(500)
    );
    let game = GameRecord {
        username: "alice".to_string(),
        score: 1,
        bonus_hits: 0,
        duration_secs: 30,
        timestamp: datetime!(2026-03-01 09:30:00 UTC),
    };
    assert_eq!(
        client.save_game(game).await.unwrap_err(),
        ServiceError::Status(500)
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let config = SheetsConfig {
        base_url: "http://127.0.0.1:1/exec".to_string(),
        timeout_secs: 2,
        ..SheetsConfig::default()
    };
    let err = ScriptClient::new(&config)
        .unwrap()
        .get_ranking()
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
}
