use std::cmp::Ordering;
use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::{Event, Game, MatchRound};
use crate::statistics::{StatKey, Statistics, StatsSummary};
use crate::store::{PlayerGames, Store};
use crate::token::{PlayerProfile, PlayerToken};

/// Players must have played more than this many games of an event to
/// appear in a limited leaderboard.
pub const QUALIFYING_GAMES: u32 = 3;

static DVTA_MENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^dvta_(tuesday|thursday)_night").expect("valid regex"));

/// Filters for `Reporter::get_players`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PlayerQuery {
    /// Case-insensitive substrings, any of which may match the name.
    pub names: Vec<String>,
    pub team: Option<String>,
    pub section: Option<u32>,
    pub competition_type: Option<String>,
    pub competition: Option<String>,
}

impl PlayerQuery {
    fn matches(&self, token: &PlayerToken) -> bool {
        if !self.names.is_empty() {
            let name = token.name.to_lowercase();
            if !self.names.iter().any(|n| name.contains(&n.to_lowercase())) {
                return false;
            }
        }
        self.team.as_ref().is_none_or(|team| token.team == *team)
            && self
                .section
                .is_none_or(|section| token.section == section.to_string())
            && self
                .competition_type
                .as_ref()
                .is_none_or(|kind| token.competition_type == *kind)
            && self
                .competition
                .as_ref()
                .is_none_or(|comp| token.competition == *comp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitionDetails {
    pub event: Vec<Event>,
    pub event_type: Vec<&'static str>,
}

/// A player's singles and doubles totals.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStats {
    #[serde(skip)]
    pub token: PlayerToken,
    #[serde(flatten)]
    pub profile: PlayerProfile,
    pub singles: StatsSummary,
    pub doubles: StatsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fixture: Option<Vec<Game>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl PlayerStats {
    pub fn event(&self, event: Event) -> &StatsSummary {
        match event {
            Event::Singles => &self.singles,
            Event::Doubles => &self.doubles,
        }
    }
}

/// One game laid out for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactMatch {
    pub match_type: Event,
    pub match_round: Option<MatchRound>,
    pub date_played: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub player: String,
    pub opposition: Vec<String>,
    pub score_for: u32,
    pub score_against: u32,
    pub team_mate: Option<String>,
    pub player_won: Option<bool>,
}

impl From<&Game> for CompactMatch {
    fn from(game: &Game) -> Self {
        Self {
            match_type: game.event(),
            match_round: game.fixture.match_round,
            date_played: game.fixture.match_date(),
            home_team: game.fixture.home_team.clone(),
            away_team: game.fixture.away_team.clone(),
            player: game.player.name.clone(),
            opposition: game.opposition.iter().map(|p| p.name.clone()).collect(),
            score_for: game.score_for,
            score_against: game.score_against,
            team_mate: game.team_mate.as_ref().map(|p| p.name.clone()),
            player_won: game.player_won(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResults {
    pub match_round: Option<MatchRound>,
    pub matches: Vec<CompactMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerResults {
    pub token: String,
    pub rounds: Vec<RoundResults>,
}

/// Read-only queries over the stored games.
pub struct Reporter {
    games: PlayerGames,
}

impl Reporter {
    pub fn new(games: PlayerGames) -> Self {
        Self { games }
    }

    pub fn from_store(store: &Store) -> Result<Self> {
        let games = store.load_all()?;
        info!(tokens = games.len(), "reporter loaded");
        Ok(Self::new(games))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &PlayerToken> {
        self.games.keys()
    }

    fn matching(&self, query: &PlayerQuery) -> Vec<&PlayerToken> {
        self.games.keys().filter(|token| query.matches(token)).collect()
    }

    pub fn get_players(&self, query: &PlayerQuery) -> Vec<PlayerProfile> {
        let profiles = self
            .matching(query)
            .into_iter()
            .map(PlayerToken::profile)
            .collect::<Vec<_>>();
        debug!(?query, matched = profiles.len(), "player query");
        profiles
    }

    pub fn get_competitions(&self) -> Vec<String> {
        self.games
            .keys()
            .map(|token| token.competition.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn get_teams(&self, query: &PlayerQuery) -> Vec<String> {
        self.matching(query)
            .into_iter()
            .map(|token| token.team.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn get_sections(&self, query: &PlayerQuery) -> Vec<u32> {
        self.matching(query)
            .into_iter()
            .filter_map(|token| token.section.parse::<u32>().ok())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Events and player categories a competition runs, keyed off the
    /// competition token prefix.
    pub fn get_competition_details(competition: &str) -> Option<CompetitionDetails> {
        let details = if DVTA_MENS.is_match(competition) {
            CompetitionDetails {
                event: vec![Event::Doubles],
                event_type: vec!["mens"],
            }
        } else if competition.starts_with("dvta_thursday_am") {
            CompetitionDetails {
                event: vec![Event::Doubles],
                event_type: vec!["womens"],
            }
        } else if competition.starts_with("dvta_friday_night") {
            CompetitionDetails {
                event: vec![Event::Singles],
                event_type: vec!["mixed"],
            }
        } else if competition.starts_with("nejta") {
            CompetitionDetails {
                event: vec![Event::Singles, Event::Doubles],
                event_type: vec!["girls", "boys"],
            }
        } else {
            return None;
        };
        Some(details)
    }

    /// The player's games in round order, finals last.
    pub fn get_player_fixtures(&self, token: &PlayerToken) -> Vec<Game> {
        let mut games = self.games.get(token).cloned().unwrap_or_default();
        games.sort_by_key(|game| game.fixture.match_round.map_or(0, |round| round.numeric()));
        games
    }

    pub fn get_player_singles(&self, token: &PlayerToken) -> Vec<Game> {
        let singles = self
            .get_player_fixtures(token)
            .into_iter()
            .filter(Game::is_singles)
            .collect::<Vec<_>>();
        debug!(%token, games = singles.len(), "singles games");
        singles
    }

    pub fn get_player_doubles(&self, token: &PlayerToken) -> Vec<Game> {
        let doubles = self
            .get_player_fixtures(token)
            .into_iter()
            .filter(Game::is_doubles)
            .collect::<Vec<_>>();
        debug!(%token, games = doubles.len(), "doubles games");
        doubles
    }

    /// Games of the deepest final reached, otherwise of the last round
    /// listed.
    pub fn last_fixture_played(games: &[Game]) -> Vec<Game> {
        let rounds = games
            .iter()
            .map(|game| game.fixture.match_round)
            .collect::<Vec<_>>();
        let Some(last) = rounds.last().copied() else {
            return Vec::new();
        };
        let last_round = [
            MatchRound::GrandFinal,
            MatchRound::PrelimFinal,
            MatchRound::SemiFinal,
        ]
        .into_iter()
        .map(Some)
        .find(|stage| rounds.contains(stage))
        .unwrap_or(last);

        games
            .iter()
            .filter(|game| game.fixture.match_round == last_round)
            .cloned()
            .collect()
    }

    /// Singles and doubles totals per token; every stored player when
    /// `tokens` is `None`.
    ///
    /// With `last_fixture` the games of the player's last fixture are
    /// attached, restricted to `event` when one is given.
    pub fn get_player_stats(
        &self,
        tokens: Option<&[PlayerToken]>,
        last_fixture: bool,
        event: Option<Event>,
    ) -> Vec<PlayerStats> {
        let tokens = match tokens {
            Some(tokens) => tokens.to_vec(),
            None => self.games.keys().cloned().collect(),
        };

        tokens
            .into_iter()
            .map(|token| {
                let games = self.get_player_fixtures(&token);
                let singles = games
                    .iter()
                    .filter(|g| g.is_singles())
                    .collect::<Statistics>();
                let doubles = games
                    .iter()
                    .filter(|g| g.is_doubles())
                    .collect::<Statistics>();

                let last_fixture = last_fixture.then(|| {
                    let scoped = games
                        .iter()
                        .filter(|g| event.is_none_or(|e| g.event() == e))
                        .cloned()
                        .collect::<Vec<_>>();
                    Self::last_fixture_played(&scoped)
                });

                PlayerStats {
                    profile: token.profile(),
                    token,
                    singles: singles.summary(),
                    doubles: doubles.summary(),
                    last_fixture,
                    rank: None,
                }
            })
            .collect()
    }

    /// Orders `stats` by one statistic of `event`, ascending unless
    /// `reverse`. A `limit` also drops players who have not played more
    /// than `QUALIFYING_GAMES` games of that event.
    pub fn sort_stats(
        mut stats: Vec<PlayerStats>,
        event: Event,
        key: StatKey,
        reverse: bool,
        limit: Option<usize>,
    ) -> Vec<PlayerStats> {
        stats.sort_by(|a, b| {
            let ordering = compare(key.value(a.event(event)), key.value(b.event(event)));
            if reverse { ordering.reverse() } else { ordering }
        });

        if let Some(limit) = limit {
            stats.retain(|s| s.event(event).games_played > QUALIFYING_GAMES);
            stats.truncate(limit);
        }
        stats
    }

    /// Assigns competition ranks: equal values share a rank and the next
    /// different value is ranked by its position.
    pub fn rank_stats(stats: &mut [PlayerStats], event: Event, key: StatKey) {
        let mut last: Option<(f64, usize)> = None;
        for (idx, stat) in stats.iter_mut().enumerate() {
            let value = key.value(stat.event(event));
            let rank = match last {
                Some((last_value, last_rank)) if last_value == value => last_rank,
                _ => idx + 1,
            };
            stat.rank = Some(rank);
            last = Some((value, rank));
        }
    }

    /// Each player's games grouped by round, singles before doubles.
    pub fn get_player_results_compact(&self, tokens: &[PlayerToken]) -> Vec<PlayerResults> {
        tokens
            .iter()
            .map(|token| {
                let games = self.get_player_fixtures(token);
                let mut rounds: Vec<RoundResults> = Vec::new();
                for event in Event::ALL {
                    for game in games.iter().filter(|g| g.event() == event) {
                        let round = game.fixture.match_round;
                        let compact = CompactMatch::from(game);
                        match rounds.iter_mut().find(|r| r.match_round == round) {
                            Some(existing) => existing.matches.push(compact),
                            None => rounds.push(RoundResults {
                                match_round: round,
                                matches: vec![compact],
                            }),
                        }
                    }
                }
                PlayerResults {
                    token: token.to_string(),
                    rounds,
                }
            })
            .collect()
    }
}

fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
