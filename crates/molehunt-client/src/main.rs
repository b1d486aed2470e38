use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use molehunt_client::command::{Command, HELP};
use molehunt_client::view::TerminalView;
use molehunt_client::{ClientConfig, Session, SessionError, SessionUpdate};
use molehunt_core::notify::CoinNotification;
use molehunt_core::service::{CoinResponse, IncomingCoinRequest};
use molehunt_sheets::ScriptClient;

type TerminalSession = Session<ScriptClient, TerminalView>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    let backend = match ScriptClient::new(&config.sheets) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Cannot reach the script endpoint: {e} (set MOLEHUNT_SCRIPT_URL)");
            std::process::exit(1);
        },
    };

    let view = TerminalView::new(config.round.slot_count);
    let (mut session, mut updates) = Session::new(backend, config, view);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_request: Option<IncomingCoinRequest> = None;

    tracing::info!("Molehunt client starting");
    println!("{HELP}");
    match session.ranking().await {
        Ok(board) => print_ranking(&board),
        Err(e) => tracing::warn!(error = %e, "Failed to load ranking"),
    }

    loop {
        tokio::select! {
            Some(token) = session.next_timer() => {
                if session.fire(token).is_some() {
                    println!("Back at the menu. Coins: {}", session.coins().unwrap_or(0));
                }
            },
            Some(update) = updates.recv() => {
                handle_update(&mut session, update, &mut pending_request).await;
            },
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read stdin");
                        break;
                    },
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => run_command(&mut session, cmd, &mut pending_request).await,
                    Err(msg) => println!("{msg}"),
                }
            },
        }
    }

    session.logout();
}

async fn handle_update(
    session: &mut TerminalSession,
    update: SessionUpdate,
    pending_request: &mut Option<IncomingCoinRequest>,
) {
    match update {
        SessionUpdate::Coin(notification) => {
            match &notification {
                CoinNotification::IncomingRequest(request) => {
                    println!(
                        "{} asks for coins: \"{}\" (accept / reject)",
                        request.from_user, request.message
                    );
                    *pending_request = Some(request.clone());
                },
                CoinNotification::RequestAccepted { by, .. } => {
                    println!("{by} accepted your coin request!");
                },
            }
            session.handle_notification(&notification).await;
            if let Some(coins) = session.coins() {
                println!("Coins: {coins}");
            }
        },
        SessionUpdate::RoundSaved(record) => {
            println!("Saved round with score {}", record.score);
        },
        SessionUpdate::Ranking(board) => print_ranking(&board),
    }
}

fn print_ranking(board: &[molehunt_client::ranking::RankedPlayer]) {
    println!("== Ranking ==");
    for row in board {
        println!("{row}");
    }
}

async fn run_command(
    session: &mut TerminalSession,
    cmd: Command,
    pending_request: &mut Option<IncomingCoinRequest>,
) {
    let outcome = match cmd {
        Command::Login { username, password } => session
            .login(&username, &password)
            .await
            .map(|coins| println!("Welcome, {username}! Coins: {coins}")),
        Command::Start => session.start_round(),
        Command::Hit(slot) => {
            if session.hit(slot).is_none() {
                println!("Miss");
            }
            Ok(())
        },
        Command::Pause => {
            if !session.toggle_pause() {
                println!("No round in progress");
            }
            Ok(())
        },
        Command::Menu { confirmed } => {
            if session.back_to_menu(confirmed) {
                println!("Menu. Coins: {}", session.coins().unwrap_or(0));
            } else {
                println!("A round is in progress; `menu y` ends it");
            }
            Ok(())
        },
        Command::Ranking => session.ranking().await.map(|board| print_ranking(&board)),
        Command::Coins => session
            .refresh_coins()
            .await
            .map(|coins| println!("Coins: {coins}")),
        Command::Request { to, message } => session
            .send_coin_request(&to, &message)
            .await
            .map(|()| println!("Coin request sent to {to}")),
        Command::Accept => answer(session, pending_request, CoinResponse::Accepted).await,
        Command::Reject => answer(session, pending_request, CoinResponse::Rejected).await,
        Command::Logout => {
            session.logout();
            *pending_request = None;
            println!("Logged out");
            Ok(())
        },
        Command::Help => {
            println!("{HELP}");
            Ok(())
        },
        Command::Quit => Ok(()),
    };

    if let Err(e) = outcome {
        println!("{e}");
    }
}

async fn answer(
    session: &mut TerminalSession,
    pending_request: &mut Option<IncomingCoinRequest>,
    response: CoinResponse,
) -> Result<(), SessionError> {
    let Some(request) = pending_request.take() else {
        println!("No coin request to answer");
        return Ok(());
    };
    session.respond_to_coin_request(&request, response).await?;
    println!("Answered {} ({})", request.from_user, response.as_str());
    Ok(())
}
