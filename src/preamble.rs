use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::MatchRound;

static COMPETITION_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(girls|boys|.*?)\s+(.*)").expect("valid regex"));
static SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.*)").expect("valid regex"));
static ROUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Rd\.(\d+)\s+(.*)").expect("valid regex"));
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(st|nd|rd|th)\s+(\w+)\s+(\d{2})(.*)").expect("valid regex")
});
static FINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(semi|prelim|grand)\s+final(.*)").expect("valid regex")
});

/// Header fields of a match page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preamble {
    pub competition_type: Option<String>,
    pub section: Option<u32>,
    pub date: Option<String>,
    pub match_round: Option<MatchRound>,
}

/// Consumes the preamble left to right:
/// `GIRLS 14  Rd.5 on 28th Feb 15`, `GIRLS 14 Semi Final` or
/// `Thu Sect 8  Rd.14 on 19th May 16`.
pub fn parse_preamble(raw: &str) -> Preamble {
    let mut preamble = Preamble::default();
    let mut rest = raw.replace('\u{a0}', " ").trim().to_string();

    if let Some(caps) = COMPETITION_TYPE.captures(&rest) {
        let kind = caps[1].to_lowercase();
        if kind == "girls" || kind == "boys" {
            preamble.competition_type = Some(kind);
        }
        rest = caps[2].to_string();
    }

    // DVTA sections read "Sect 8" and mid-week ladies "MWL 3".
    for marker in ["Sect ", "MWL "] {
        if let Some(stripped) = rest.strip_prefix(marker) {
            rest = stripped.to_string();
        }
    }

    if let Some(caps) = SECTION.captures(&rest) {
        preamble.section = caps[1].parse().ok();
        rest = caps[2].to_string();
    }

    if let Some(caps) = ROUND.captures(&rest) {
        preamble.match_round = caps[1].parse().ok().map(MatchRound::Round);
        rest = caps[2].to_string();
    }

    if let Some(stripped) = rest.strip_prefix("on ") {
        rest = stripped.to_string();
    }

    if let Some(caps) = DATE.captures(&rest) {
        preamble.date = Some(format!("{} {} {}", &caps[1], &caps[3], &caps[4]));
        rest = caps[5].trim_start().to_string();
    }

    if let Some(caps) = FINAL.captures(&rest) {
        preamble.match_round = match caps[1].to_lowercase().as_str() {
            "semi" => Some(MatchRound::SemiFinal),
            "prelim" => Some(MatchRound::PrelimFinal),
            _ => Some(MatchRound::GrandFinal),
        };
        rest = caps[2].to_string();
    }

    let rest = rest.trim();
    if !rest.is_empty() {
        warn!(preamble = raw, unparsed = rest, "preamble tokens left over");
    }
    debug!(?preamble, "parsed preamble");
    preamble
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nejta_round() {
        let preamble = parse_preamble("GIRLS 14\u{a0}\u{a0}Rd.5 on 28th Feb 15");
        assert_eq!(
            preamble,
            Preamble {
                competition_type: Some("girls".to_string()),
                section: Some(14),
                date: Some("28 Feb 15".to_string()),
                match_round: Some(MatchRound::Round(5)),
            }
        );
    }

    #[test]
    fn nejta_semi_final() {
        let preamble = parse_preamble("BOYS 3 Semi Final");
        assert_eq!(preamble.competition_type.as_deref(), Some("boys"));
        assert_eq!(preamble.section, Some(3));
        assert_eq!(preamble.match_round, Some(MatchRound::SemiFinal));
        assert_eq!(preamble.date, None);
    }

    #[test]
    fn dvta_section_marker() {
        let preamble = parse_preamble("Thu Sect 8  Rd.14 on 19th May 16");
        assert_eq!(preamble.competition_type, None);
        assert_eq!(preamble.section, Some(8));
        assert_eq!(preamble.match_round, Some(MatchRound::Round(14)));
        assert_eq!(preamble.date.as_deref(), Some("19 May 16"));
    }

    #[test]
    fn grand_final_after_date() {
        let preamble = parse_preamble("GIRLS 2 on 21st Mar 15 Grand Final");
        assert_eq!(preamble.date.as_deref(), Some("21 Mar 15"));
        assert_eq!(preamble.match_round, Some(MatchRound::GrandFinal));
    }

    #[test]
    fn leftovers_do_not_abort() {
        let preamble = parse_preamble("GIRLS 14 Rd.5 on 28th Feb 15 (washed out)");
        assert_eq!(preamble.match_round, Some(MatchRound::Round(5)));
        assert_eq!(preamble.date.as_deref(), Some("28 Feb 15"));
    }
}
