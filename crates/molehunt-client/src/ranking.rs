use std::fmt;

use molehunt_core::service::RankingEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }
}

/// One row of the leaderboard as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPlayer {
    /// 1-based.
    pub position: usize,
    pub medal: Option<Medal>,
    pub entry: RankingEntry,
}

/// Keep the first `limit` entries in service order and number them.
pub fn leaderboard(entries: Vec<RankingEntry>, limit: usize) -> Vec<RankedPlayer> {
    entries
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| RankedPlayer {
            position: i + 1,
            medal: Medal::for_position(i + 1),
            entry,
        })
        .collect()
}

impl fmt::Display for RankedPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let medal = self.medal.map(|m| m.symbol()).unwrap_or("  ");
        write!(
            f,
            "{medal} {:>2}. {:<16} {:>6} pts | {} golden | {} games",
            self.position,
            self.entry.username,
            self.entry.total_score,
            self.entry.bonus_hits,
            self.entry.games_played,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> RankingEntry {
        RankingEntry {
            username: name.to_string(),
            total_score: score,
            bonus_hits: 0,
            games_played: 1,
        }
    }

    #[test]
    fn top_three_get_medals() {
        let entries = (0..5).map(|i| entry(&format!("p{i}"), 100 - i)).collect();
        let board = leaderboard(entries, 10);
        assert_eq!(board.len(), 5);
        assert_eq!(board[0].medal, Some(Medal::Gold));
        assert_eq!(board[1].medal, Some(Medal::Silver));
        assert_eq!(board[2].medal, Some(Medal::Bronze));
        assert_eq!(board[3].medal, None);
        assert_eq!(board[4].position, 5);
    }

    #[test]
    fn truncated_to_limit() {
        let entries = (0..15).map(|i| entry(&format!("p{i}"), 15 - i)).collect();
        let board = leaderboard(entries, 10);
        assert_eq!(board.len(), 10);
        assert_eq!(board[9].entry.username, "p9");
    }

    #[test]
    fn service_order_is_kept() {
        let board = leaderboard(vec![entry("low", 1), entry("high", 99)], 10);
        assert_eq!(board[0].entry.username, "low");
    }

    #[test]
    fn display_line() {
        let board = leaderboard(vec![entry("alice", 120)], 10);
        let line = board[0].to_string();
        assert!(line.starts_with("🥇  1. alice"));
        assert!(line.contains("120 pts"));
        assert!(line.contains("1 games"));
    }
}
