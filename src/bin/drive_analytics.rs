use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use log::{debug, info};
use serde::Serialize;

use drive_analytics::{
    aggregate_hotspots, hotspots_matching_tag, AnalysisConfig, Hotspot, HotspotIndex, JsonDirSessionStore,
    SessionAnalyzer, SessionStore,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Driving-practice session analytics", long_about = None)]
struct Cli {
    /// Directory holding one `<session_id>.json` per session
    #[arg(short, long, default_value = "sessions", value_hint = ValueHint::DirPath)]
    sessions: PathBuf,

    /// Analysis configuration JSON (partial files keep defaults)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, action = ArgAction::SetTrue)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fleet overview across all stored sessions
    Overview,
    /// Report for a single session
    Route {
        /// Session identifier
        session_id: String,
    },
    /// Listing rows, most recent first
    List,
    /// Hotspots, optionally filtered by tag or location
    Hotspots(HotspotArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Parser, Debug)]
struct HotspotArgs {
    /// Keep hotspots whose dominant tag loosely matches this tag
    #[arg(long)]
    tag: Option<String>,

    /// Keep hotspots near `LAT,LON`
    #[arg(long, value_parser = parse_lat_lon)]
    near: Option<(f64, f64)>,

    /// Search radius for `--near` in meters
    #[arg(long, default_value_t = 250.0)]
    radius: f64,
}

fn parse_lat_lon(value: &str) -> std::result::Result<(f64, f64), String> {
    let (lat, lon) = value.split_once(',').ok_or_else(|| format!("expected LAT,LON, got {value:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {lat},{lon}"));
    }
    Ok((lat, lon))
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    AnalysisConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn handle_hotspots(store: &JsonDirSessionStore, config: &AnalysisConfig, args: &HotspotArgs) -> Result<Vec<Hotspot>> {
    if args.radius < 0.0 {
        bail!("--radius must be non-negative, got {}", args.radius);
    }
    let sessions = store.list().context("listing sessions")?;
    let hotspots = aggregate_hotspots(&sessions, &config.heatmap).hotspots;

    let mut selected: Vec<Hotspot> = match &args.tag {
        Some(tag) => hotspots_matching_tag(&hotspots, tag).into_iter().cloned().collect(),
        None => hotspots,
    };

    if let Some((lat, lon)) = args.near {
        let index = HotspotIndex::new(&selected);
        let nearby: Vec<Hotspot> = index.within(lat, lon, args.radius).into_iter().map(|(h, _)| h.clone()).collect();
        debug!("{} of {} hotspots within {} m of {},{}", nearby.len(), index.len(), args.radius, lat, lon);
        selected = nearby;
    }

    Ok(selected)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;
    let store = JsonDirSessionStore::open(&cli.sessions)
        .with_context(|| format!("opening session directory {}", cli.sessions.display()))?;
    info!("Reading sessions from {}", store.root().display());

    let analyzer = SessionAnalyzer::with_config(store, config);
    match &cli.command {
        Command::Overview => emit(&analyzer.overview().context("building overview")?, cli.pretty),
        Command::Route { session_id } => {
            let report = analyzer
                .route_report(session_id)
                .with_context(|| format!("analysing session {session_id}"))?;
            emit(&report, cli.pretty)
        }
        Command::List => emit(&analyzer.summaries().context("listing sessions")?, cli.pretty),
        Command::Hotspots(args) => {
            let hotspots = handle_hotspots(analyzer.store(), analyzer.config(), args)?;
            emit(&hotspots, cli.pretty)
        }
        Command::Config => emit(analyzer.config(), cli.pretty),
    }
}
