use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::model::Game;

const SEPARATOR: char = '~';

/// Identifies a player within one team, section and competition.
///
/// The text form `name~team~section~type~competition` is the store key;
/// absent fields are written as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerToken {
    pub name: String,
    pub team: String,
    pub section: String,
    pub competition_type: String,
    pub competition: String,
}

impl PlayerToken {
    pub fn from_game(game: &Game) -> Self {
        Self {
            name: game.player.name.clone(),
            team: game.player.team.clone().unwrap_or_default(),
            section: game
                .fixture
                .section
                .map(|s| s.to_string())
                .unwrap_or_default(),
            competition_type: game.fixture.competition_type.clone().unwrap_or_default(),
            competition: game.fixture.competition.clone(),
        }
    }

    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            name: self.name.clone(),
            team: self.team.clone(),
            section: self.section.clone(),
            comp_type: self.competition_type.clone(),
            comp: self.competition.clone(),
            comp_string: competition_label(&self.competition),
            token: self.to_string(),
        }
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.name, self.team, self.section, self.competition_type, self.competition
        )
    }
}

impl FromStr for PlayerToken {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let parts = raw.split(SEPARATOR).collect::<Vec<_>>();
        let [name, team, section, competition_type, competition] = parts.as_slice() else {
            bail!("player token needs 5 '~' separated fields: {raw:?}");
        };
        Ok(Self {
            name: name.to_string(),
            team: team.to_string(),
            section: section.to_string(),
            competition_type: competition_type.to_string(),
            competition: competition.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    pub name: String,
    pub team: String,
    pub section: String,
    pub comp_type: String,
    pub comp: String,
    pub comp_string: String,
    pub token: String,
}

/// `nejta_saturday_am_spring_2015` -> `NEJTA Saturday AM Spring 2015`.
///
/// The league prefix and the time-of-day slot are upper-cased, the day and
/// season title-cased and the year left alone.
pub fn competition_label(competition: &str) -> String {
    let parts = competition.split('_').collect::<Vec<_>>();
    if parts.len() != 5 {
        return competition.to_string();
    }
    [
        parts[0].to_uppercase(),
        title_case(parts[1]),
        parts[2].to_uppercase(),
        title_case(parts[3]),
        parts[4].to_string(),
    ]
    .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "Isabella Markovski~Watsonia~14~girls~nejta_saturday_am_spring_2015";

    #[test]
    fn token_text_round_trip() {
        let token: PlayerToken = TOKEN.parse().unwrap();
        assert_eq!(token.name, "Isabella Markovski");
        assert_eq!(token.section, "14");
        assert_eq!(token.to_string(), TOKEN);
        assert!("a~b~c".parse::<PlayerToken>().is_err());
    }

    #[test]
    fn profile_expands_token() {
        let profile = TOKEN.parse::<PlayerToken>().unwrap().profile();
        assert_eq!(profile.comp_type, "girls");
        assert_eq!(profile.comp_string, "NEJTA Saturday AM Spring 2015");
        assert_eq!(profile.token, TOKEN);
    }

    #[test]
    fn competition_label_keeps_odd_shapes() {
        assert_eq!(
            competition_label("dvta_thursday_night_autumn_2016"),
            "DVTA Thursday NIGHT Autumn 2016"
        );
        assert_eq!(competition_label("custom"), "custom");
    }
}
