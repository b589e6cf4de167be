use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trols_stats::config::Config;
use trols_stats::export;
use trols_stats::loader::fetch_competition;
use trols_stats::model::Event;
use trols_stats::reporter::{PlayerQuery, Reporter};
use trols_stats::statistics::StatKey;
use trols_stats::store::{self, Store};
use trols_stats::token::PlayerToken;

const USAGE: &str = "usage: trols_stats <fetch|build|players|stats|results> [options]
  fetch    [--league L] [--force]
  build    [--cache DIR] [--db PATH]
  players  [filters]
  stats    [filters] [--event singles|doubles] [--key FIELD] [--reverse]
           [--limit N] [--last-fixture] [--xlsx PATH] [--json PATH]
  results  --token TOKEN [--token TOKEN ...]
filters: --name NAME (repeatable) --team T --section N --type girls|boys --competition C
common:  --config ENV_FILE --db PATH";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trols_stats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::from_env();
    let Some(command) = args.command() else {
        eprintln!("{USAGE}");
        bail!("missing command");
    };

    match command {
        "fetch" => run_fetch(&args),
        "build" => run_build(&args),
        "players" => run_players(&args),
        "stats" => run_stats(&args),
        "results" => run_results(&args),
        other => {
            eprintln!("{USAGE}");
            Err(anyhow!("unknown command {other:?}"))
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let env_file = args.value("--config").map(PathBuf::from);
    Config::load(env_file.as_deref()).map_err(|err| {
        warn!(code = err.code(), help = err.help(), "configuration error");
        anyhow::Error::from(err)
    })
}

fn open_store(args: &Args) -> Result<Store> {
    let path = match args.value("--db") {
        Some(path) => PathBuf::from(path),
        None => load_config(args)?.store_path,
    };
    Store::open(&path)
}

fn run_fetch(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let league = args.value("--league");
    let force = args.flag("--force");

    let codes = config.competition_codes(league);
    if codes.is_empty() {
        bail!("no competition codes configured for {}", league.unwrap_or("any league"));
    }

    for (league, code) in codes {
        match fetch_competition(&config, &league, &code, force) {
            Ok(summary) => {
                println!(
                    "{}: sections={} matches={} errors={}",
                    summary.competition,
                    summary.sections,
                    summary.matches,
                    summary.errors.len()
                );
                for err in summary.errors.iter().take(6) {
                    println!("   - {err}");
                }
            }
            Err(err) => println!("{league}/{code}: failed: {err:#}"),
        }
    }
    Ok(())
}

fn run_build(args: &Args) -> Result<()> {
    let cache_dir = match args.value("--cache") {
        Some(dir) => PathBuf::from(dir),
        None => load_config(args)?.cache_dir,
    };
    let mut store = open_store(args)?;
    let tokens = store::construct(&mut store, &cache_dir)?;
    info!(tokens, "build complete");
    println!("Player tokens stored: {tokens}");
    Ok(())
}

fn run_players(args: &Args) -> Result<()> {
    let reporter = Reporter::from_store(&open_store(args)?)?;
    let players = reporter.get_players(&args.query()?);
    println!("{}", serde_json::to_string_pretty(&players)?);
    Ok(())
}

fn run_stats(args: &Args) -> Result<()> {
    let reporter = Reporter::from_store(&open_store(args)?)?;
    let event = args
        .value("--event")
        .map(str::parse::<Event>)
        .transpose()?
        .unwrap_or(Event::Singles);
    let key = args
        .value("--key")
        .map(str::parse::<StatKey>)
        .transpose()?
        .unwrap_or(StatKey::ScoreFor);
    let limit = args
        .value("--limit")
        .map(|raw| raw.parse::<usize>().with_context(|| format!("invalid --limit {raw}")))
        .transpose()?;

    let tokens = reporter
        .get_players(&args.query()?)
        .into_iter()
        .map(|profile| profile.token.parse::<PlayerToken>())
        .collect::<Result<Vec<_>>>()?;
    let stats = reporter.get_player_stats(Some(&tokens), args.flag("--last-fixture"), Some(event));
    let mut stats = Reporter::sort_stats(stats, event, key, args.flag("--reverse"), limit);
    Reporter::rank_stats(&mut stats, event, key);

    if let Some(path) = args.value("--xlsx") {
        let report = export::export_stats_xlsx(&PathBuf::from(path), &stats)?;
        println!("Workbook: {path} (singles={}, doubles={})", report.singles, report.doubles);
    }
    match args.value("--json") {
        Some(path) => export::write_json(&PathBuf::from(path), &stats)?,
        None => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}

fn run_results(args: &Args) -> Result<()> {
    let tokens = args
        .values("--token")
        .into_iter()
        .map(str::parse::<PlayerToken>)
        .collect::<Result<Vec<_>>>()?;
    if tokens.is_empty() {
        bail!("results needs at least one --token");
    }
    let reporter = Reporter::from_store(&open_store(args)?)?;
    let results = reporter.get_player_results_compact(&tokens);
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

struct Args {
    raw: Vec<String>,
}

impl Args {
    fn from_env() -> Self {
        Self {
            raw: std::env::args().skip(1).collect(),
        }
    }

    fn command(&self) -> Option<&str> {
        self.raw.first().map(String::as_str)
    }

    /// Every value given for `name`, as `--name=value` or `--name value`.
    fn values(&self, name: &str) -> Vec<&str> {
        let prefix = format!("{name}=");
        let mut out = Vec::new();
        for (idx, arg) in self.raw.iter().enumerate() {
            if let Some(value) = arg.strip_prefix(&prefix) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
            }
            if arg == name
                && let Some(next) = self.raw.get(idx + 1)
                && !next.trim().is_empty()
            {
                out.push(next.trim());
            }
        }
        out
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.values(name).into_iter().next()
    }

    fn flag(&self, name: &str) -> bool {
        self.raw.iter().any(|arg| arg == name)
    }

    fn query(&self) -> Result<PlayerQuery> {
        let section = self
            .value("--section")
            .map(|raw| raw.parse::<u32>().with_context(|| format!("invalid --section {raw}")))
            .transpose()?;
        Ok(PlayerQuery {
            names: self.values("--name").into_iter().map(str::to_string).collect(),
            team: self.value("--team").map(str::to_string),
            section,
            competition_type: self.value("--type").map(str::to_string),
            competition: self.value("--competition").map(str::to_string),
        })
    }
}
