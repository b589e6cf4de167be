use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::config::Config;
use crate::game_builder::{GameBuilder, Roster};
use crate::http_cache::{CacheTarget, comp_token_from_file_name, fetch_html_cached};
use crate::match_scores::scrape_match_scores;
use crate::model::{Fixture, Game};
use crate::scrape;

/// Collects `Game`s from cached match pages.
#[derive(Debug, Default)]
pub struct Loader {
    games: Vec<Game>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the games of one match page. `source_file` is the cache file
    /// name, whose prefix before `--` is the competition token.
    pub fn build_game_map(&mut self, html: &str, source_file: &str) -> Result<usize> {
        let competition = comp_token_from_file_name(source_file);
        let teams = scrape::scrape_match_teams(html, true)?
            .ok_or_else(|| anyhow!("{source_file}: expected home and away teams"))?;
        let names = scrape::scrape_player_names(html)?;
        let preamble = scrape::scrape_match_preamble(html)?;
        let scores = scrape_match_scores(html)?;

        let fixture = Fixture {
            competition: competition.to_string(),
            competition_type: preamble.competition_type,
            section: preamble.section,
            date: preamble.date,
            match_round: preamble.match_round,
            home_team: teams.home_team.clone(),
            away_team: teams.away_team.clone(),
        };

        let mut builder = GameBuilder::new(Roster::new(&names, teams), fixture);
        let added = builder.build(&scores);
        self.games.extend(builder.into_games());
        info!(file = source_file, games = added, "loaded match page");
        Ok(added)
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn into_games(self) -> Vec<Game> {
        self.games
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub competition: String,
    pub sections: usize,
    pub matches: usize,
    pub errors: Vec<String>,
}

/// Fetches every match page of one competition code into the cache.
///
/// The results page lists the sections of the competition; each section
/// page lists its matches.
pub fn fetch_competition(
    config: &Config,
    league: &str,
    code: &str,
    force: bool,
) -> Result<FetchSummary> {
    let main_results = config.main_results()?;
    let page = fetch_html_cached(main_results, &[("daytime", code)], None)
        .with_context(|| format!("fetch results page for {code}"))?;

    let competition = scrape::scrape_competition_name(&page, code, Some(league), true)?
        .ok_or_else(|| anyhow!("competition {code} not listed on results page"))?;
    let sections = scrape::scrape_competition_ids(&page)?;

    let mut summary = FetchSummary {
        competition: competition.clone(),
        sections: sections.len(),
        ..FetchSummary::default()
    };

    for (section_name, section_code) in &sections {
        let form = [("daytime", code), ("section", section_code.as_str())];
        let match_ids = match fetch_html_cached(main_results, &form, None)
            .and_then(|html| scrape::scrape_match_ids(&html))
        {
            Ok(ids) => ids,
            Err(err) => {
                warn!(section = %section_name, error = %err, "section fetch failed");
                summary.errors.push(format!("{section_name}: {err}"));
                continue;
            }
        };

        for match_id in &match_ids {
            let target = CacheTarget {
                dir: &config.cache_dir,
                comp_token: &competition,
                match_id,
                force,
            };
            let fetched = config
                .match_url(match_id)
                .map_err(anyhow::Error::from)
                .and_then(|url| fetch_html_cached(&url, &[], Some(&target)));
            match fetched {
                Ok(_) => summary.matches += 1,
                Err(err) => {
                    warn!(match_id = %match_id, error = %err, "match fetch failed");
                    summary.errors.push(format!("{match_id}: {err}"));
                }
            }
        }
    }

    info!(
        competition = %summary.competition,
        sections = summary.sections,
        matches = summary.matches,
        "competition fetched"
    );
    Ok(summary)
}

/// Reads every `*.html` page in `dir` into a loader. Pages that fail to
/// parse are logged and skipped.
pub fn load_directory(dir: &Path) -> Result<Loader> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("read cache dir {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
        .collect::<Vec<_>>();
    entries.sort();

    let mut loader = Loader::new();
    for path in entries {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let html = match std::fs::read_to_string(&path) {
            Ok(html) => html,
            Err(err) => {
                warn!(file = file_name, error = %err, "unreadable page");
                continue;
            }
        };
        if let Err(err) = loader.build_game_map(&html, file_name) {
            warn!(file = file_name, error = %err, "skipping page");
        }
    }
    Ok(loader)
}
