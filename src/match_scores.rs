use std::collections::BTreeMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scrape::{leading_text, parse_page, selector};

/// Position of a player on the score sheet: 1-4 home, 5-8 away.
pub type PlayerCode = u8;

/// Away players are listed with home-relative codes on the score sheet.
pub const AWAY_OFFSET: PlayerCode = 4;

/// Codes a score sheet may use for either side.
const SHEET_CODES: std::ops::RangeInclusive<PlayerCode> = 1..=AWAY_OFFSET;

const SCORE_CELLS: &str = r#"td table tr[valign*="top"] > td"#;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// The player code(s) of one side of a rubber: `1` or `1+4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub lead: PlayerCode,
    pub partner: Option<PlayerCode>,
}

impl Pairing {
    pub fn is_singles(&self) -> bool {
        self.partner.is_none()
    }

    fn offset(&self, by: PlayerCode) -> (PlayerCode, Option<PlayerCode>) {
        (self.lead + by, self.partner.map(|p| p + by))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    fn offset(self) -> PlayerCode {
        match self {
            Side::Home => 0,
            Side::Away => AWAY_OFFSET,
        }
    }
}

/// Which player of a pairing a record is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Lead,
    Partner,
}

/// One rubber from one player's point of view, still in player codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedGame {
    pub team_mate: Option<PlayerCode>,
    pub opposition: (PlayerCode, Option<PlayerCode>),
    pub score_for: u32,
    pub score_against: u32,
}

/// Player code to every rubber that player took part in, in sheet order.
pub type MatchScores = BTreeMap<PlayerCode, Vec<CodedGame>>;

/// Reads the score table of a match page.
pub fn scrape_match_scores(html: &str) -> Result<MatchScores> {
    let document = parse_page(html);
    let cells = selector(SCORE_CELLS)?;
    let texts = document
        .select(&cells)
        .map(|cell| leading_text(&cell))
        .collect::<Vec<_>>();
    Ok(parse_score_cells(&texts))
}

/// Walks the cells in `home codes / score / away codes` triples.
///
/// Empty cells still take their slot in the triple. A triple missing any
/// of its parts is dropped with a warning.
pub fn parse_score_cells(cells: &[Option<String>]) -> MatchScores {
    let mut scores = MatchScores::new();
    let mut home: Option<Pairing> = None;
    let mut score: Option<(u32, u32)> = None;

    for (idx, cell) in cells.iter().enumerate() {
        let Some(text) = cell.as_deref() else {
            warn!(cell = idx, "score cell has no text");
            if idx % 3 == 2 {
                home = None;
                score = None;
            }
            continue;
        };

        match idx % 3 {
            0 => home = extract_player_codes(text),
            1 => {
                score = parse_score_pair(text);
                if score.is_none() {
                    warn!(cell = idx, text, "unable to parse score");
                }
            }
            _ => {
                let away = extract_player_codes(text);
                match (home, score, away) {
                    (Some(home), Some(score), Some(away)) => {
                        debug!(?home, ?score, ?away, "rubber");
                        record_rubber(&mut scores, home, away, score);
                    }
                    _ => warn!(cell = idx, "incomplete rubber skipped"),
                }
                home = None;
                score = None;
            }
        }
    }

    scores
}

fn record_rubber(scores: &mut MatchScores, home: Pairing, away: Pairing, score: (u32, u32)) {
    let seats = [
        (Side::Home, Seat::Lead, Some(home.lead)),
        (Side::Home, Seat::Partner, home.partner),
        (Side::Away, Seat::Lead, Some(away.lead + AWAY_OFFSET)),
        (Side::Away, Seat::Partner, away.partner.map(|p| p + AWAY_OFFSET)),
    ];
    for (side, seat, code) in seats {
        let Some(code) = code else {
            continue;
        };
        if let Some(game) = create_stat(home, away, score, side, seat) {
            scores.entry(code).or_default().push(game);
        }
    }
}

/// `"1"` -> `1`, `"1+4"` -> `1` partnered with `4`.
///
/// Codes are de-duplicated and ordered, so `"2+1"` reads as `1+2`.
/// Numbers outside the 1-4 sheet range are ignored.
pub fn extract_player_codes(raw: &str) -> Option<Pairing> {
    let mut codes = NUMBER
        .find_iter(raw)
        .filter_map(|m| match m.as_str().parse::<PlayerCode>() {
            Ok(code) if SHEET_CODES.contains(&code) => Some(code),
            _ => {
                warn!(raw, code = m.as_str(), "player code out of range");
                None
            }
        })
        .collect::<Vec<_>>();
    codes.sort_unstable();
    codes.dedup();
    let mut codes = codes.into_iter();
    let lead = codes.next()?;
    Some(Pairing {
        lead,
        partner: codes.next(),
    })
}

/// Exactly two numbers, e.g. `6-3`. Anything else is not a finished score.
pub fn parse_score_pair(raw: &str) -> Option<(u32, u32)> {
    let nums = NUMBER
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .collect::<Vec<_>>();
    match nums.as_slice() {
        [score_for, score_against] => Some((*score_for, *score_against)),
        _ => None,
    }
}

/// Builds the record for one seat of a rubber. The partner seat of a
/// singles rubber has nobody in it and yields `None`.
pub fn create_stat(
    home: Pairing,
    away: Pairing,
    score: (u32, u32),
    side: Side,
    seat: Seat,
) -> Option<CodedGame> {
    let (own, opposing, opposing_side) = match side {
        Side::Home => (home, away, Side::Away),
        Side::Away => (away, home, Side::Home),
    };
    let (lead, partner) = own.offset(side.offset());

    let team_mate = match seat {
        Seat::Lead => partner,
        Seat::Partner if own.is_singles() => return None,
        Seat::Partner => Some(lead),
    };

    let (score_for, score_against) = match side {
        Side::Home => score,
        Side::Away => (score.1, score.0),
    };

    Some(CodedGame {
        team_mate,
        opposition: opposing.offset(opposing_side.offset()),
        score_for,
        score_against,
    })
}
