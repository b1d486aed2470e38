//! Line commands understood by the terminal client.

use molehunt_core::target::SlotIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Start,
    /// Slot numbers are 1-based on the command line.
    Hit(SlotIndex),
    Pause,
    Menu { confirmed: bool },
    Ranking,
    Coins,
    Request { to: String, message: String },
    Accept,
    Reject,
    Logout,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <name> <4-digit password>
  start                  start a round (costs 1 coin)
  <n> | hit <n>          hit slot n
  pause                  pause or resume
  menu [y]               leave the round (y confirms ending it)
  ranking                show the top players
  coins                  refresh your coin balance
  request <name> <msg>   ask another player for coins
  accept | reject        answer the last coin request
  logout | help | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(h, r)| (h, r.trim()))
            .unwrap_or((line, ""));

        let cmd = match head.to_ascii_lowercase().as_str() {
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(username), Some(password)) => Self::Login {
                        username: username.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err("usage: login <name> <password>".to_string()),
                }
            },
            "start" => Self::Start,
            "hit" => Self::Hit(parse_slot(rest)?),
            "pause" | "p" => Self::Pause,
            "menu" | "back" => Self::Menu {
                confirmed: matches!(rest, "y" | "yes"),
            },
            "ranking" | "rank" => Self::Ranking,
            "coins" => Self::Coins,
            "request" => match rest.split_once(char::is_whitespace) {
                Some((to, message)) => Self::Request {
                    to: to.to_string(),
                    message: message.trim().to_string(),
                },
                None => return Err("usage: request <name> <message>".to_string()),
            },
            "accept" => Self::Accept,
            "reject" => Self::Reject,
            "logout" => Self::Logout,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other if other.chars().all(|c| c.is_ascii_digit()) && !other.is_empty() => {
                Self::Hit(parse_slot(other)?)
            },
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(cmd)
    }
}

fn parse_slot(s: &str) -> Result<SlotIndex, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("not a slot number: {s}")),
    }
}
