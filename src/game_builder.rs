use tracing::{debug, warn};

use crate::match_scores::{AWAY_OFFSET, CodedGame, MatchScores, PlayerCode};
use crate::model::{Fixture, Game, Player};
use crate::scrape::Teams;

const SLOTS: usize = 8;

/// Names and teams of the eight score-sheet slots of one match.
#[derive(Debug, Clone)]
pub struct Roster {
    names: [Option<String>; SLOTS],
    teams: Teams,
}

impl Roster {
    pub fn new(names: &[(PlayerCode, String)], teams: Teams) -> Self {
        let mut slots: [Option<String>; SLOTS] = Default::default();
        for (code, name) in names {
            match Self::slot(*code) {
                Some(idx) => slots[idx] = Some(name.clone()),
                None => warn!(code, name = %name, "player code outside 1-8"),
            }
        }
        Self {
            names: slots,
            teams,
        }
    }

    fn slot(code: PlayerCode) -> Option<usize> {
        (1..=SLOTS as PlayerCode)
            .contains(&code)
            .then(|| usize::from(code - 1))
    }

    pub fn team(&self, code: PlayerCode) -> Option<&str> {
        let idx = Self::slot(code)?;
        if idx < usize::from(AWAY_OFFSET) {
            Some(&self.teams.home_team)
        } else {
            Some(&self.teams.away_team)
        }
    }

    pub fn player(&self, code: PlayerCode) -> Option<Player> {
        let idx = Self::slot(code)?;
        let name = self.names[idx].clone()?;
        Some(Player::new(name, self.team(code).map(str::to_string)))
    }
}

/// Turns a match's coded score table into per-player `Game`s.
///
/// Players and fixtures are interned so that equal values are only
/// stored once per build.
#[derive(Debug)]
pub struct GameBuilder {
    roster: Roster,
    fixture: Fixture,
    players: Vec<Player>,
    fixtures: Vec<Fixture>,
    games: Vec<Game>,
}

impl GameBuilder {
    pub fn new(roster: Roster, fixture: Fixture) -> Self {
        let mut builder = Self {
            roster,
            fixture: Fixture::default(),
            players: Vec::new(),
            fixtures: Vec::new(),
            games: Vec::new(),
        };
        builder.fixture = builder.intern_fixture(fixture);
        builder
    }

    pub fn intern_player(&mut self, player: Player) -> Player {
        if let Some(known) = self.players.iter().find(|p| **p == player) {
            return known.clone();
        }
        self.players.push(player.clone());
        player
    }

    pub fn intern_fixture(&mut self, fixture: Fixture) -> Fixture {
        if let Some(known) = self.fixtures.iter().find(|f| **f == fixture) {
            return known.clone();
        }
        self.fixtures.push(fixture.clone());
        fixture
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn into_games(self) -> Vec<Game> {
        self.games
    }

    fn lookup(&mut self, code: PlayerCode) -> Option<Player> {
        let player = self.roster.player(code)?;
        Some(self.intern_player(player))
    }

    /// Adds a `Game` for every coded record. Records naming a slot with no
    /// player are skipped.
    pub fn build(&mut self, scores: &MatchScores) -> usize {
        let before = self.games.len();
        for (code, coded) in scores {
            let Some(player) = self.lookup(*code) else {
                warn!(code, "no player in slot");
                continue;
            };
            for record in coded {
                match self.game_for(player.clone(), record) {
                    Some(game) => self.games.push(game),
                    None => warn!(code, ?record, "record references an empty slot"),
                }
            }
        }
        let added = self.games.len() - before;
        debug!(added, competition = %self.fixture.competition, "built games");
        added
    }

    fn game_for(&mut self, player: Player, record: &CodedGame) -> Option<Game> {
        let team_mate = match record.team_mate {
            Some(code) => Some(self.lookup(code)?),
            None => None,
        };
        let (lead, partner) = record.opposition;
        let mut opposition = vec![self.lookup(lead)?];
        if let Some(code) = partner {
            opposition.push(self.lookup(code)?);
        }
        Some(Game {
            fixture: self.fixture.clone(),
            player,
            team_mate,
            opposition,
            score_for: record.score_for,
            score_against: record.score_against,
            uid: None,
        })
    }
}
