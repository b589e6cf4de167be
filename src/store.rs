use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::loader::load_directory;
use crate::model::Game;
use crate::token::PlayerToken;

/// Every game of every player, keyed by player token.
pub type PlayerGames = BTreeMap<PlayerToken, Vec<Game>>;

/// Player token to JSON game list, kept in SQLite.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Swaps the whole store content for `games` in one transaction.
    pub fn replace_all(&mut self, games: &PlayerGames) -> Result<usize> {
        let updated_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().context("begin store transaction")?;
        tx.execute("DELETE FROM player_games", [])
            .context("clear player_games")?;
        for (token, player_games) in games {
            let json = serde_json::to_string(player_games)
                .with_context(|| format!("serialize games of {token}"))?;
            tx.execute(
                "INSERT INTO player_games (token, games, updated_at) VALUES (?1, ?2, ?3)",
                params![token.to_string(), json, updated_at],
            )
            .with_context(|| format!("insert games of {token}"))?;
        }
        tx.commit().context("commit store transaction")?;
        Ok(games.len())
    }

    pub fn get(&self, token: &PlayerToken) -> Result<Option<Vec<Game>>> {
        let raw = self
            .conn
            .query_row(
                "SELECT games FROM player_games WHERE token = ?1",
                params![token.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("query player games")?;
        raw.map(|json| {
            serde_json::from_str(&json).with_context(|| format!("decode games of {token}"))
        })
        .transpose()
    }

    pub fn tokens(&self) -> Result<Vec<PlayerToken>> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM player_games ORDER BY token")
            .context("prepare token query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query tokens")?;

        let mut tokens = Vec::new();
        for raw in rows {
            let raw = raw.context("read token row")?;
            tokens.push(raw.parse()?);
        }
        Ok(tokens)
    }

    pub fn load_all(&self) -> Result<PlayerGames> {
        let mut stmt = self
            .conn
            .prepare("SELECT token, games FROM player_games")
            .context("prepare games query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .context("query games")?;

        let mut games = PlayerGames::new();
        for row in rows {
            let (token, json) = row.context("read games row")?;
            let decoded = serde_json::from_str::<Vec<Game>>(&json)
                .with_context(|| format!("decode games of {token}"))?;
            games.insert(token.parse()?, decoded);
        }
        Ok(games)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS player_games (
            token TEXT PRIMARY KEY,
            games TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn group_by_token(games: impl IntoIterator<Item = Game>) -> PlayerGames {
    let mut grouped = PlayerGames::new();
    for game in games {
        grouped
            .entry(PlayerToken::from_game(&game))
            .or_default()
            .push(game);
    }
    grouped
}

/// Rebuilds the store from the match pages cached in `raw_dir`. Returns
/// the number of player tokens written.
pub fn construct(store: &mut Store, raw_dir: &Path) -> Result<usize> {
    let loader = load_directory(raw_dir)?;
    let games = loader.into_games();
    let game_count = games.len();
    let grouped = group_by_token(games);
    let tokens = store.replace_all(&grouped)?;
    info!(games = game_count, tokens, dir = %raw_dir.display(), "store constructed");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fixture, MatchRound, Player};

    fn game(name: &str, score_for: u32) -> Game {
        Game {
            fixture: Fixture {
                competition: "nejta_saturday_am_autumn_2015".to_string(),
                competition_type: Some("girls".to_string()),
                section: Some(14),
                date: Some("28 Feb 15".to_string()),
                match_round: Some(MatchRound::Round(5)),
                home_team: "Watsonia".to_string(),
                away_team: "Eltham".to_string(),
            },
            player: Player::new(name, Some("Watsonia".to_string())),
            team_mate: None,
            opposition: vec![Player::new("Lauren Amsing", Some("Eltham".to_string()))],
            score_for,
            score_against: 2,
            uid: None,
        }
    }

    #[test]
    fn open_reports_unusable_store_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = match Store::open(&blocker.join("db").join("trols_stats.db")) {
            Ok(_) => panic!("store opened under a regular file"),
            Err(err) => err,
        };
        assert!(format!("{err:#}").contains("create store dir"));
    }

    #[test]
    fn groups_games_by_token() {
        let grouped = group_by_token(vec![game("Tara Watson", 6), game("Tara Watson", 3)]);
        assert_eq!(grouped.len(), 1);
        let (token, games) = grouped.iter().next().unwrap();
        assert_eq!(
            token.to_string(),
            "Tara Watson~Watsonia~14~girls~nejta_saturday_am_autumn_2015"
        );
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn replace_all_then_read_back() {
        let mut store = Store::open_in_memory().unwrap();
        let grouped = group_by_token(vec![game("Tara Watson", 6), game("Maria Lam", 1)]);
        assert_eq!(store.replace_all(&grouped).unwrap(), 2);

        let tokens = store.tokens().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].name, "Maria Lam");

        let games = store.get(&tokens[1]).unwrap().unwrap();
        assert_eq!(games[0].score_for, 6);
        assert_eq!(store.load_all().unwrap(), grouped);

        let only = group_by_token(vec![game("Maria Lam", 4)]);
        store.replace_all(&only).unwrap();
        assert!(store.get(&tokens[1]).unwrap().is_none());
    }
}
