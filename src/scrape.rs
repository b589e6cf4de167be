//! Field extraction from TROLS results and match pages.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::preamble::{Preamble, parse_preamble};

const SECTION_OPTIONS: &str = r#"select#section[name="section"] > option"#;
const ONCLICK: &str = "[onclick]";
const TEAM_CELLS: &str = "table td > b";
const TABLE_CELLS: &str = "td";
const PREAMBLE_CELL: &str = r#"td[class*="mb"]"#;
const LATE_START: &str = "(Late Start)";

static MATCH_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^open_match\(event,'.*','(\w+)'\);").expect("valid regex")
});
static PLAYER_SLOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\.").expect("valid regex"));
static PLAYER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\.\s+").expect("valid regex"));
static SELF_CLOSING_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<script\b([^>]*?)\s*/>").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teams {
    pub home_team: String,
    pub away_team: String,
}

/// Parses a TROLS page. Older results pages close `<script .../>` inline,
/// which an HTML5 parser reads as the start of a script running to the end
/// of the document.
pub(crate) fn parse_page(html: &str) -> Html {
    Html::parse_document(&SELF_CLOSING_SCRIPT.replace_all(html, "<script$1></script>"))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("invalid selector {css:?}: {err:?}"))
}

/// The element's first child when that child is text, i.e. the text
/// before any nested markup.
pub(crate) fn leading_text(element: &ElementRef<'_>) -> Option<String> {
    element
        .first_child()
        .and_then(|node| node.value().as_text())
        .map(|text| (**text).to_string())
}

/// Section names to section codes from the results page, e.g.
/// `GIRLS 1 -> AA026`.
pub fn scrape_competition_ids(html: &str) -> Result<BTreeMap<String, String>> {
    let document = parse_page(html);
    let options = selector(SECTION_OPTIONS)?;

    let mut ids = BTreeMap::new();
    for option in document.select(&options) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let name = leading_text(&option).unwrap_or_default();
        debug!(name = %name, code = value, "competition id");
        ids.insert(name, value.to_string());
    }
    info!(count = ids.len(), "scraped competition ids");
    Ok(ids)
}

/// Name of the competition listed under `code`, e.g.
/// `Saturday AM - Autumn 2015`. With a league the name is prefixed by the
/// league in capitals; `tokenise` turns it into an identifier such as
/// `nejta_saturday_am_autumn_2015`.
pub fn scrape_competition_name(
    html: &str,
    code: &str,
    league: Option<&str>,
    tokenise: bool,
) -> Result<Option<String>> {
    let document = parse_page(html);
    let option = selector(&format!(r#"option[value="{code}"]"#))?;

    let Some(raw) = document
        .select(&option)
        .next()
        .and_then(|element| leading_text(&element))
    else {
        warn!(code, "competition name not found");
        return Ok(None);
    };

    let mut name = raw.trim().to_string();
    if let Some(league) = league {
        name = format!("{} {}", league.to_uppercase(), name);
    }
    info!(competition = %name, "scraped competition name");

    if tokenise {
        name = tokenise_competition(&name);
    }
    Ok(Some(name))
}

pub fn tokenise_competition(name: &str) -> String {
    name.replace(" - ", "_").replace(' ', "_").to_lowercase()
}

/// Match ids from the `open_match(event,'','AA039054');` handlers of a
/// section page.
pub fn scrape_match_ids(html: &str) -> Result<Vec<String>> {
    let document = parse_page(html);
    let clickable = selector(ONCLICK)?;

    let ids = document
        .select(&clickable)
        .filter_map(|element| element.value().attr("onclick"))
        .filter_map(|handler| MATCH_ID.captures(handler))
        .map(|caps| caps[1].to_string())
        .collect::<Vec<_>>();
    debug!(?ids, "match ids");
    Ok(ids)
}

/// Home and away team names from the match header.
///
/// Clubs entering several teams tag them with a coloured `<span>`
/// (`Watsonia <span>Red</span>`). With `resolve_colors` the first colour
/// found is appended to the home team and the last to the away team.
pub fn scrape_match_teams(html: &str, resolve_colors: bool) -> Result<Option<Teams>> {
    let document = parse_page(html);
    let cells = selector(TEAM_CELLS)?;
    let bold = document.select(&cells).collect::<Vec<_>>();

    let [home, away] = bold.as_slice() else {
        warn!(found = bold.len(), "expecting two teams");
        return Ok(None);
    };
    let mut home_team = leading_text(home).unwrap_or_default();
    let mut away_team = leading_text(away).unwrap_or_default();

    if resolve_colors {
        home_team = with_team_color(&bold, &home_team, false);
        away_team = with_team_color(&bold, &away_team, true);
    }

    let teams = Teams {
        home_team: home_team.replace('\u{a0}', " "),
        away_team: away_team.replace('\u{a0}', " "),
    };
    debug!(?teams, "teams");
    Ok(Some(teams))
}

fn with_team_color(bold: &[ElementRef<'_>], team: &str, away: bool) -> String {
    if team.trim().is_empty() {
        return team.to_string();
    }
    let colors = bold
        .iter()
        .filter(|b| leading_text(b).is_some_and(|text| text.contains(team)))
        .flat_map(|b| b.children().filter_map(ElementRef::wrap))
        .filter(|child| child.value().name() == "span")
        .flat_map(|span| span.text().map(str::to_string).collect::<Vec<_>>())
        .map(|color| color.replace(LATE_START, ""))
        .filter(|color| !color.is_empty())
        .collect::<Vec<_>>();

    let color = if away { colors.last() } else { colors.first() };
    match color {
        Some(color) => format!("{team}{color}").trim_end().to_string(),
        None => team.trim_end().to_string(),
    }
}

/// Player names in sheet order: home 1-4 then away 5-8.
pub fn scrape_player_names(html: &str) -> Result<Vec<(u8, String)>> {
    let document = parse_page(html);
    let cells = selector(TABLE_CELLS)?;

    let names = document
        .select(&cells)
        .filter_map(|cell| leading_text(&cell))
        .filter(|text| PLAYER_SLOT.is_match(text))
        .map(|text| PLAYER_PREFIX.replace(&text, "").trim_end().to_string())
        .zip(1u8..)
        .map(|(name, code)| (code, name))
        .collect::<Vec<_>>();
    debug!(?names, "player names");
    Ok(names)
}

/// Raw preamble text, e.g. `GIRLS 14  Rd.5 on 28th Feb 15`.
pub fn scrape_preamble_text(html: &str) -> Result<Option<String>> {
    let document = parse_page(html);
    let cell = selector(PREAMBLE_CELL)?;
    Ok(document
        .select(&cell)
        .next()
        .and_then(|element| leading_text(&element)))
}

pub fn scrape_match_preamble(html: &str) -> Result<Preamble> {
    match scrape_preamble_text(html)? {
        Some(raw) => Ok(parse_preamble(&raw)),
        None => {
            warn!("match page has no preamble");
            Ok(Preamble::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(home: &str, away: &str) -> String {
        format!(
            "<html><body><table><tr><td><b>{home}</b></td><td><b>{away}</b></td></tr></table></body></html>"
        )
    }

    #[test]
    fn teams_without_color_resolution_keep_trailing_space() {
        let html = header("Watsonia&nbsp;<span>Red</span>", "Eltham");
        let teams = scrape_match_teams(&html, false).unwrap().unwrap();
        assert_eq!(teams.home_team, "Watsonia ");
        assert_eq!(teams.away_team, "Eltham");
    }

    #[test]
    fn both_teams_colored() {
        let html = header(
            "Watsonia&nbsp;<span>Red</span>",
            "Watsonia&nbsp;<span>Blue</span>",
        );
        let teams = scrape_match_teams(&html, true).unwrap().unwrap();
        assert_eq!(teams.home_team, "Watsonia Red");
        assert_eq!(teams.away_team, "Watsonia Blue");
    }

    #[test]
    fn away_team_colored_only() {
        let html = header("Bundoora", "Watsonia&nbsp;<span>Blue</span>");
        let teams = scrape_match_teams(&html, true).unwrap().unwrap();
        assert_eq!(teams.home_team, "Bundoora");
        assert_eq!(teams.away_team, "Watsonia Blue");
    }

    #[test]
    fn late_start_marker_is_not_a_color() {
        let html = header("Clifton&nbsp;<span>(Late Start)</span>", "Eltham");
        let teams = scrape_match_teams(&html, true).unwrap().unwrap();
        assert_eq!(teams.home_team, "Clifton");
    }

    #[test]
    fn team_without_leading_text_takes_no_color() {
        let html = header("<span>Red</span>", "Watsonia&nbsp;<span>Blue</span>");
        let teams = scrape_match_teams(&html, true).unwrap().unwrap();
        assert_eq!(teams.home_team, "");
        assert_eq!(teams.away_team, "Watsonia Blue");
    }

    #[test]
    fn self_closing_script_does_not_swallow_page() {
        let html = r#"<html><head>
            <script type="text/javaScript" src="/js/result.js"/>
            <SCRIPT src="/js/tinybox.js" />
            </head><body><select id="section" name="section">
            <option value="AA026">GIRLS 1</option>
            </select></body></html>"#;
        let ids = scrape_competition_ids(html).unwrap();
        assert_eq!(ids.get("GIRLS 1").map(String::as_str), Some("AA026"));
    }

    #[test]
    fn single_team_cell_yields_none() {
        let html = "<table><tr><td><b>Eltham</b></td></tr></table>";
        assert_eq!(scrape_match_teams(html, true).unwrap(), None);
    }

    #[test]
    fn match_ids_from_onclick() {
        let html = r#"<table><tr>
            <td onclick="open_match(event,'','AA039054');">Rd 1</td>
            <td onclick="open_match(event,'x','AA039055');">Rd 2</td>
            <td onclick="toggle();">menu</td>
        </tr></table>"#;
        assert_eq!(scrape_match_ids(html).unwrap(), vec!["AA039054", "AA039055"]);
    }

    #[test]
    fn tokenises_competition_names() {
        assert_eq!(
            tokenise_competition("NEJTA Saturday AM - Autumn 2015"),
            "nejta_saturday_am_autumn_2015"
        );
    }
}
