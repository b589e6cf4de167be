use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::model::Game;

const WINNING_SCORE: u32 = 6;

/// Running totals over a player's games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    games_played: u32,
    games_won: u32,
    games_lost: u32,
    score_for: u32,
    score_against: u32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&mut self, game: &Game) {
        self.games_played += 1;
        self.score_for += game.score_for;
        self.score_against += game.score_against;
        if game.score_for == WINNING_SCORE {
            self.games_won += 1;
        }
        if game.score_against == WINNING_SCORE {
            self.games_lost += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.score_against == 0 {
            return 0.0;
        }
        f64::from(self.score_for) / f64::from(self.score_against) * 100.0
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            games_played: self.games_played,
            games_won: self.games_won,
            games_lost: self.games_lost,
            score_for: self.score_for,
            score_against: self.score_against,
            percentage: self.percentage(),
        }
    }
}

impl<'a> FromIterator<&'a Game> for Statistics {
    fn from_iter<I: IntoIterator<Item = &'a Game>>(games: I) -> Self {
        let mut stats = Statistics::new();
        for game in games {
            stats.aggregate(game);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub score_for: u32,
    pub score_against: u32,
    pub percentage: f64,
}

/// Field of a `StatsSummary` that reports can sort and rank on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    GamesPlayed,
    GamesWon,
    GamesLost,
    ScoreFor,
    ScoreAgainst,
    Percentage,
}

impl StatKey {
    pub fn value(&self, summary: &StatsSummary) -> f64 {
        match self {
            StatKey::GamesPlayed => f64::from(summary.games_played),
            StatKey::GamesWon => f64::from(summary.games_won),
            StatKey::GamesLost => f64::from(summary.games_lost),
            StatKey::ScoreFor => f64::from(summary.score_for),
            StatKey::ScoreAgainst => f64::from(summary.score_against),
            StatKey::Percentage => summary.percentage,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::GamesPlayed => "games_played",
            StatKey::GamesWon => "games_won",
            StatKey::GamesLost => "games_lost",
            StatKey::ScoreFor => "score_for",
            StatKey::ScoreAgainst => "score_against",
            StatKey::Percentage => "percentage",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKey {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "games_played" => Ok(StatKey::GamesPlayed),
            "games_won" => Ok(StatKey::GamesWon),
            "games_lost" => Ok(StatKey::GamesLost),
            "score_for" => Ok(StatKey::ScoreFor),
            "score_against" => Ok(StatKey::ScoreAgainst),
            "percentage" => Ok(StatKey::Percentage),
            other => Err(anyhow!("unknown statistic {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fixture, Player};

    fn game(score_for: u32, score_against: u32) -> Game {
        Game {
            fixture: Fixture::default(),
            player: Player::new("Madeline Doyle", Some("Watsonia".to_string())),
            team_mate: None,
            opposition: vec![Player::new("Lauren Amsing", Some("Eltham".to_string()))],
            score_for,
            score_against,
            uid: None,
        }
    }

    #[test]
    fn aggregates_wins_and_losses() {
        let games = [game(6, 3), game(6, 0), game(6, 4), game(6, 0), game(0, 0)];
        let summary = games.iter().collect::<Statistics>().summary();
        assert_eq!(summary.games_played, 5);
        assert_eq!(summary.games_won, 4);
        assert_eq!(summary.games_lost, 0);
        assert_eq!(summary.score_for, 24);
        assert_eq!(summary.score_against, 7);
        assert_eq!(summary.percentage, 342.85714285714283);
    }

    #[test]
    fn percentage_is_zero_without_score_against() {
        let stats = [game(6, 0)].iter().collect::<Statistics>();
        assert_eq!(stats.percentage(), 0.0);
        assert_eq!(Statistics::new().summary(), StatsSummary::default());
    }

    #[test]
    fn stat_key_reads_fields() {
        let summary = [game(2, 6)].iter().collect::<Statistics>().summary();
        assert_eq!(StatKey::GamesLost.value(&summary), 1.0);
        assert_eq!("score_against".parse::<StatKey>().unwrap(), StatKey::ScoreAgainst);
        assert!("elo".parse::<StatKey>().is_err());
    }
}
