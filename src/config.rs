use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

const CACHE_DIR: &str = "trols_stats";
const STORE_DIR: &str = "trols_shelve";
const STORE_FILE: &str = "trols_stats.db";

pub const MAIN_RESULTS_KEY: &str = "TROLS_MAIN_RESULTS";
pub const MATCH_RESULTS_KEY: &str = "TROLS_MATCH_RESULTS";
pub const LEAGUES_KEY: &str = "TROLS_LEAGUES";
pub const CACHE_DIR_KEY: &str = "TROLS_CACHE_DIR";
pub const STORE_KEY: &str = "TROLS_STORE";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub main_results: Option<String>,
    /// Match page URL with a `{match_id}` placeholder.
    pub match_results: Option<String>,
    /// League name to the competition codes listed under it, e.g.
    /// `dvta -> [TN, HN]`.
    pub leagues: BTreeMap<String, Vec<String>>,
    pub cache_dir: PathBuf,
    pub store_path: PathBuf,
}

impl Config {
    /// Loads `.env.local` and `.env` (or `env_file` when given) into the
    /// process environment, then reads the `TROLS_*` keys.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)
                    .map_err(|_| ConfigError::FileNotFound(path.to_path_buf()))?;
            }
            None => {
                let _ = dotenvy::from_filename(".env.local");
                let _ = dotenvy::from_filename(".env");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let main_results = value(MAIN_RESULTS_KEY);
        let match_results = value(MATCH_RESULTS_KEY);
        let leagues = match value(LEAGUES_KEY) {
            Some(raw) => parse_leagues(&raw)?,
            None => BTreeMap::new(),
        };
        if main_results.is_none() && match_results.is_none() && leagues.is_empty() {
            return Err(ConfigError::NothingDefined);
        }

        let tmp = tmp_dir(&lookup);
        let cache_dir = value(CACHE_DIR_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| tmp.join(CACHE_DIR));
        let store_path = value(STORE_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| tmp.join(STORE_DIR).join(STORE_FILE));
        debug!(cache = %cache_dir.display(), store = %store_path.display(), "config loaded");

        Ok(Self {
            main_results,
            match_results,
            leagues,
            cache_dir,
            store_path,
        })
    }

    pub fn main_results(&self) -> Result<&str, ConfigError> {
        self.main_results
            .as_deref()
            .ok_or(ConfigError::MissingValue(MAIN_RESULTS_KEY))
    }

    pub fn match_url(&self, match_id: &str) -> Result<String, ConfigError> {
        let template = self
            .match_results
            .as_deref()
            .ok_or(ConfigError::MissingValue(MATCH_RESULTS_KEY))?;
        if !template.contains("{match_id}") {
            return Err(ConfigError::InvalidValue {
                key: MATCH_RESULTS_KEY,
                value: template.to_string(),
            });
        }
        Ok(template.replace("{match_id}", match_id))
    }

    /// `(league, code)` pairs, optionally restricted to one league.
    pub fn competition_codes(&self, league: Option<&str>) -> Vec<(String, String)> {
        self.leagues
            .iter()
            .filter(|(name, _)| league.is_none_or(|wanted| wanted.eq_ignore_ascii_case(name)))
            .flat_map(|(name, codes)| codes.iter().map(move |code| (name.clone(), code.clone())))
            .collect()
    }
}

/// Parses `nejta=AA;dvta=TN,HN`.
pub fn parse_leagues(raw: &str) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: LEAGUES_KEY,
        value: raw.to_string(),
    };

    let mut leagues = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, codes) = entry.split_once('=').ok_or_else(invalid)?;
        let name = name.trim().to_ascii_lowercase();
        let codes = codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if name.is_empty() || codes.is_empty() {
            return Err(invalid());
        }
        leagues.insert(name, codes);
    }
    Ok(leagues)
}

fn tmp_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("TMPDIR")
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}
