//! lhx-etl - listening history join pipeline
//!
//! Stages, each runnable on its own:
//! 1. `download`: Last.fm history pages → `lastfm/<page>.xml`
//! 2. `consolidate`: pages → `lastfm_tracks.json`
//! 3. `fetch-features`: song searches → `echonest/<md5>.json`, `search_index.json`
//! 4. `fetch-releases`: releases → `musicbrainz/<mbid>.json`, `release_years.json`
//! 5. `join`: → `enriched_tracks.json`
//! 6. `report`: aggregate statistics as JSON on stdout
//!
//! `init-config` writes the resolved settings to the config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use lhx_common::config::{load_toml_config, resolve_config_path, write_toml_config};
use lhx_etl::cache::{FileCacheStore, Fetcher};
use lhx_etl::config::{CliOverrides, EtlSettings, LASTFM_USER_ENV};
use lhx_etl::models::{EnrichedTrack, ReleaseRecord, ScrobbleRecord};
use lhx_etl::pipeline::{
    download_history, dump_records, fill_cache, join, load_history, load_records, release_keys,
    track_keys, unique_lookup_keys, unique_release_ids, ReleaseIndex, SearchEntry, SearchIndex,
    ENRICHED_TRACKS_FILE, LASTFM_TRACKS_FILE, RELEASE_YEARS_FILE, SEARCH_INDEX_FILE,
};
use lhx_etl::report::{build_report, DEFAULT_TOP_N};
use lhx_etl::services::{
    EchonestClient, LastfmClient, MusicBrainzClient, RetryingFetcher, ThrottledFetcher,
};

/// Command-line arguments for lhx-etl
#[derive(Parser, Debug)]
#[command(name = "lhx-etl")]
#[command(about = "Join Last.fm scrobbles with audio features and release years")]
#[command(version)]
struct Args {
    /// Config file (default: <config_dir>/lhx/lhx.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding caches and consolidated files
    #[arg(short, long, global = true)]
    data_folder: Option<PathBuf>,

    /// Last.fm user name
    #[arg(short, long, global = true, env = LASTFM_USER_ENV)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download history pages that are not cached yet
    Download {
        /// Keep the cached first page instead of re-fetching it
        #[arg(long)]
        no_refresh: bool,
    },
    /// Merge cached history pages into lastfm_tracks.json
    Consolidate,
    /// Search audio features for every distinct artist/track
    FetchFeatures,
    /// Look up release years for every distinct release id
    FetchReleases,
    /// Join scrobbles, features and years into enriched_tracks.json
    Join,
    /// Print aggregate statistics as JSON
    Report {
        /// Length of the top artist and track lists
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
    /// Run every stage from download to join
    Run {
        #[arg(long)]
        no_refresh: bool,
    },
    /// Save the resolved data folder and user to the config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config =
        load_toml_config(config_path.as_deref()).context("Failed to load configuration")?;

    lhx_common::logging::init_tracing(&toml_config.logging.level)
        .context("Failed to initialize logging")?;

    info!(
        "lhx-etl {} [{}] built {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let settings = EtlSettings::resolve(
        &toml_config,
        CliOverrides {
            data_folder: args.data_folder,
            lastfm_user: args.user,
        },
    );
    settings
        .data
        .ensure_directories_exist()
        .context("Failed to initialize data folder")?;
    info!("Data folder: {}", settings.data.root().display());

    match args.command {
        Command::Download { no_refresh } => download(&settings, !no_refresh).await,
        Command::Consolidate => consolidate(&settings).map(|_| ()),
        Command::FetchFeatures => {
            let scrobbles = scrobbles(&settings)?;
            fetch_features(&settings, &scrobbles).await.map(|_| ())
        }
        Command::FetchReleases => {
            let scrobbles = scrobbles(&settings)?;
            fetch_releases(&settings, &scrobbles).await.map(|_| ())
        }
        Command::Join => run_join(&settings).map(|_| ()),
        Command::Report { top } => report(&settings, top),
        Command::Run { no_refresh } => {
            download(&settings, !no_refresh).await?;
            let scrobbles = consolidate(&settings)?;
            let search = fetch_features(&settings, &scrobbles).await?;
            let releases = fetch_releases(&settings, &scrobbles).await?;
            write_join(&settings, &scrobbles, &search, &releases).map(|_| ())
        }
        Command::InitConfig { force } => {
            let path = config_path.context("No config file location available")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file {} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            write_toml_config(&settings.to_toml(&toml_config), &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote config file {}", path.display());
            Ok(())
        }
    }
}

/// Wrap a client so every attempt is throttled and failures are retried
fn politely<F: Fetcher>(settings: &EtlSettings, client: F) -> RetryingFetcher<ThrottledFetcher<F>> {
    RetryingFetcher::new(
        ThrottledFetcher::new(client, settings.request_delay),
        settings.retry,
    )
}

async fn download(settings: &EtlSettings, refresh_first: bool) -> Result<()> {
    let (api_key, user) = settings.require_lastfm()?;
    let client = LastfmClient::new(api_key, user, settings.lastfm_base_url.clone())?;
    let fetcher = politely(settings, client);
    let store = FileCacheStore::new(settings.data.lastfm_dir());

    let summary = download_history(&store, &fetcher, refresh_first)
        .await
        .context("History download failed")?;
    info!(
        total_pages = summary.total_pages,
        cached = summary.pages.cached,
        fetched = summary.pages.fetched,
        failed = summary.pages.failed,
        "Download complete"
    );
    Ok(())
}

fn consolidate(settings: &EtlSettings) -> Result<Vec<ScrobbleRecord>> {
    let scrobbles = load_history(&settings.data.lastfm_dir()).context("Failed to load history")?;
    dump_records(&settings.data.consolidated_path(LASTFM_TRACKS_FILE), &scrobbles)?;
    Ok(scrobbles)
}

/// Consolidated scrobbles when present, otherwise the cached pages
fn scrobbles(settings: &EtlSettings) -> Result<Vec<ScrobbleRecord>> {
    let path = settings.data.consolidated_path(LASTFM_TRACKS_FILE);
    if path.is_file() {
        return Ok(load_records(&path)?);
    }
    Ok(load_history(&settings.data.lastfm_dir())?)
}

async fn fetch_features(settings: &EtlSettings, scrobbles: &[ScrobbleRecord]) -> Result<SearchIndex> {
    let api_key = settings.require_echonest_key()?;
    let client = EchonestClient::new(api_key, settings.echonest_base_url.clone())?;
    let fetcher = politely(settings, client);
    let store = FileCacheStore::new(settings.data.echonest_dir());

    let keys = unique_lookup_keys(scrobbles);
    info!(scrobbles = scrobbles.len(), distinct = keys.len(), "Searching audio features");

    let summary = fill_cache(&store, &fetcher, track_keys(&keys)).await?;
    info!(
        cached = summary.cached,
        fetched = summary.fetched,
        failed = summary.failed,
        "Feature search complete"
    );

    let index = SearchIndex::load(&store, &keys).context("Failed to read cached searches")?;
    dump_records(&settings.data.consolidated_path(SEARCH_INDEX_FILE), &index.to_entries())?;
    Ok(index)
}

async fn fetch_releases(settings: &EtlSettings, scrobbles: &[ScrobbleRecord]) -> Result<ReleaseIndex> {
    let client = MusicBrainzClient::new(settings.musicbrainz_base_url.clone())?;
    let fetcher = politely(settings, client);
    let store = FileCacheStore::new(settings.data.musicbrainz_dir());

    let ids = unique_release_ids(scrobbles);
    info!(distinct = ids.len(), "Looking up release years");

    let summary = fill_cache(&store, &fetcher, release_keys(&ids)).await?;
    info!(
        cached = summary.cached,
        fetched = summary.fetched,
        failed = summary.failed,
        "Release lookup complete"
    );

    let index = ReleaseIndex::load(&store, &ids).context("Failed to read cached releases")?;
    dump_records(&settings.data.consolidated_path(RELEASE_YEARS_FILE), &index.to_records())?;
    Ok(index)
}

fn run_join(settings: &EtlSettings) -> Result<Vec<EnrichedTrack>> {
    let scrobbles = scrobbles(settings)?;

    let search_path = settings.data.consolidated_path(SEARCH_INDEX_FILE);
    let search = if search_path.is_file() {
        SearchIndex::from_entries(load_records::<SearchEntry>(&search_path)?)
    } else {
        let store = FileCacheStore::new(settings.data.echonest_dir());
        SearchIndex::load(&store, &unique_lookup_keys(&scrobbles))?
    };

    let releases_path = settings.data.consolidated_path(RELEASE_YEARS_FILE);
    let releases = if releases_path.is_file() {
        ReleaseIndex::from_records(load_records::<ReleaseRecord>(&releases_path)?)
    } else {
        let store = FileCacheStore::new(settings.data.musicbrainz_dir());
        ReleaseIndex::load(&store, &unique_release_ids(&scrobbles))?
    };

    write_join(settings, &scrobbles, &search, &releases)
}

fn write_join(
    settings: &EtlSettings,
    scrobbles: &[ScrobbleRecord],
    search: &SearchIndex,
    releases: &ReleaseIndex,
) -> Result<Vec<EnrichedTrack>> {
    let enriched = join(scrobbles, search, releases);
    let with_audio = enriched.iter().filter(|t| t.audio.is_some()).count();
    let with_year = enriched.iter().filter(|t| t.album.year.is_some()).count();
    info!(
        tracks = enriched.len(),
        with_audio, with_year, "Join complete"
    );

    dump_records(&settings.data.consolidated_path(ENRICHED_TRACKS_FILE), &enriched)?;
    Ok(enriched)
}

fn report(settings: &EtlSettings, top: usize) -> Result<()> {
    let path = settings.data.consolidated_path(ENRICHED_TRACKS_FILE);
    let enriched = if path.is_file() {
        load_records(&path)?
    } else {
        run_join(settings)?
    };

    let report = build_report(&enriched, top);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
