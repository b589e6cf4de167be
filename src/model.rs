use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date layout carried by match preambles, e.g. `28 Feb 15`.
pub const FIXTURE_DATE_FORMAT: &str = "%d %b %y";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>, team: Option<String>) -> Self {
        Self {
            name: name.into(),
            team,
            uid: None,
        }
    }
}

// Players are the same person when name and team agree; uid is bookkeeping.
impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.team == other.team
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.team.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMatchRound", into = "RawMatchRound")]
pub enum MatchRound {
    Round(u32),
    SemiFinal,
    PrelimFinal,
    GrandFinal,
}

impl MatchRound {
    /// Ordering key: finals sort after every ordinary round.
    pub fn numeric(&self) -> u32 {
        match self {
            MatchRound::Round(n) => *n,
            MatchRound::SemiFinal => 100,
            MatchRound::PrelimFinal => 1000,
            MatchRound::GrandFinal => 10000,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, MatchRound::Round(_))
    }
}

impl fmt::Display for MatchRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRound::Round(n) => write!(f, "{n}"),
            MatchRound::SemiFinal => f.write_str("Semi Final"),
            MatchRound::PrelimFinal => f.write_str("Prelim Final"),
            MatchRound::GrandFinal => f.write_str("Grand Final"),
        }
    }
}

impl FromStr for MatchRound {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<u32>() {
            return Ok(MatchRound::Round(n));
        }
        match raw.to_ascii_lowercase().as_str() {
            "semi final" => Ok(MatchRound::SemiFinal),
            "prelim final" => Ok(MatchRound::PrelimFinal),
            "grand final" => Ok(MatchRound::GrandFinal),
            _ => Err(anyhow!("unknown match round {raw:?}")),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawMatchRound {
    Number(u32),
    Label(String),
}

impl TryFrom<RawMatchRound> for MatchRound {
    type Error = anyhow::Error;

    fn try_from(raw: RawMatchRound) -> Result<Self> {
        match raw {
            RawMatchRound::Number(n) => Ok(MatchRound::Round(n)),
            RawMatchRound::Label(label) => label.parse(),
        }
    }
}

impl From<MatchRound> for RawMatchRound {
    fn from(round: MatchRound) -> Self {
        match round {
            MatchRound::Round(n) => RawMatchRound::Number(n),
            named => RawMatchRound::Label(named.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    pub competition: String,
    #[serde(default)]
    pub competition_type: Option<String>,
    #[serde(default)]
    pub section: Option<u32>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub match_round: Option<MatchRound>,
    pub home_team: String,
    pub away_team: String,
}

impl Fixture {
    pub fn match_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw, FIXTURE_DATE_FORMAT).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Singles,
    Doubles,
}

impl Event {
    pub const ALL: [Event; 2] = [Event::Singles, Event::Doubles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Singles => "singles",
            Event::Doubles => "doubles",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "singles" => Ok(Event::Singles),
            "doubles" => Ok(Event::Doubles),
            other => Err(anyhow!("unknown event {other:?}")),
        }
    }
}

/// One player's view of a single rubber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub fixture: Fixture,
    pub player: Player,
    #[serde(default)]
    pub team_mate: Option<Player>,
    pub opposition: Vec<Player>,
    pub score_for: u32,
    pub score_against: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

const WINNING_SCORES: [u32; 2] = [6, 8];

impl Game {
    pub fn is_singles(&self) -> bool {
        self.team_mate.is_none()
    }

    pub fn is_doubles(&self) -> bool {
        self.team_mate.is_some()
    }

    pub fn event(&self) -> Event {
        if self.is_singles() {
            Event::Singles
        } else {
            Event::Doubles
        }
    }

    /// `None` for unfinished rubbers and drawn sets such as 8-8.
    pub fn player_won(&self) -> Option<bool> {
        let (ours, theirs) = (self.score_for, self.score_against);
        if WINNING_SCORES.contains(&ours) && ours > theirs {
            Some(true)
        } else if WINNING_SCORES.contains(&theirs) && theirs > ours {
            Some(false)
        } else {
            None
        }
    }
}
