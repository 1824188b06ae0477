use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use folio_cache::MemoryStorage;
use folio_core::{
    http_data_acquisition, nav_candidates, veil, DeepLinkOutcome, DeepLinkResolver, Document,
    LayoutSnapshot, MemoryDocument, NavCandidate, NavigationSynchronizer, PageConfig,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "folio=info";

fn cli() -> Command {
    Command::new("folio")
        .version(folio_core::VERSION)
        .about("Folio page orchestration tools")
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch and validate the content document")
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Content document URL (overrides config)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML page configuration"),
                ),
        )
        .subcommand(
            Command::new("active")
                .about("Resolve the active section for a layout snapshot")
                .arg(
                    Arg::new("layout")
                        .long("layout")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("LayoutSnapshot JSON file"),
                )
                .arg(
                    Arg::new("payload")
                        .long("payload")
                        .value_parser(value_parser!(PathBuf))
                        .help("Content document deciding which sections are enabled"),
                )
                .arg(
                    Arg::new("fragment")
                        .long("fragment")
                        .default_value("")
                        .help("URL fragment present at load, e.g. #projects"),
                )
                .arg(
                    Arg::new("pivot")
                        .long("pivot")
                        .default_value("0.35")
                        .value_parser(value_parser!(f64))
                        .help("Pivot as a fraction of the viewport height"),
                ),
        )
        .subcommand(
            Command::new("veil")
                .about("Print the content veil for a loader progress")
                .arg(
                    Arg::new("progress")
                        .long("progress")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Loader progress, 0 to 100"),
                )
                .arg(
                    Arg::new("hidden")
                        .long("hidden")
                        .action(ArgAction::SetTrue)
                        .help("Loader not shown"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[derive(Debug, Serialize)]
struct FetchReport {
    url: String,
    loading: bool,
    from_cache: bool,
    error: Option<String>,
    sections: Vec<String>,
    payload: Value,
}

#[derive(Debug, PartialEq, Serialize)]
struct ActiveReport {
    active: Option<String>,
    scroll_y: f64,
    deep_link: Option<DeepLinkOutcome>,
}

#[derive(Debug, PartialEq, Serialize)]
struct VeilReport {
    opacity: f64,
    scale: f64,
    blur_px: f64,
    css: Option<String>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn fetch(args: &ArgMatches) -> anyhow::Result<()> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => PageConfig::load(path)?,
        None => PageConfig::from_env()?,
    };
    if let Some(url) = args.get_one::<String>("url") {
        config = config.with_data_url(url.clone());
    }

    let data = http_data_acquisition(&config, Arc::new(MemoryStorage::new()))?;
    info!(url = %config.data_url(), timeout_ms = config.fetch_timeout_ms, "fetching content document");
    data.activate(config.data_url())
        .await
        .context("fetch task did not complete")?;

    let snapshot = data.snapshot();
    let sections = nav_candidates(&snapshot.payload)
        .into_iter()
        .filter(|c| c.enabled)
        .map(|c| c.id.to_string())
        .collect();
    print_json(&FetchReport {
        url: snapshot.url,
        loading: snapshot.loading,
        from_cache: snapshot.from_cache,
        error: snapshot.error.clone(),
        sections,
        payload: snapshot.payload,
    })?;

    if let Some(error) = snapshot.error {
        warn!(error = %error, "content document rejected");
        bail!("fetch failed: {error}");
    }
    Ok(())
}

/// Evaluate `layout` once, then apply the deep link with no further mutations
fn resolve_active(
    layout: &LayoutSnapshot,
    candidates: Vec<NavCandidate>,
    fragment: &str,
    pivot_fraction: f64,
) -> ActiveReport {
    let doc = MemoryDocument::from_layout(layout).with_fragment(fragment);
    let mut nav = NavigationSynchronizer::new(candidates, fragment, pivot_fraction).with_fragment_sync(false);
    nav.evaluate_now(&doc);

    let mut link = DeepLinkResolver::new(fragment, Duration::ZERO);
    link.start(&mut nav, &doc, Instant::now());
    link.on_deadline(&mut nav, &doc);
    debug!(
        anchors = layout.anchors.len(),
        active = ?nav.active(),
        outcome = ?link.outcome(),
        "resolved active section"
    );

    ActiveReport {
        active: nav.active().map(ToString::to_string),
        scroll_y: doc.scroll_y(),
        deep_link: link.outcome().cloned(),
    }
}

fn active(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<PathBuf>("layout")
        .context("--layout is required")?;
    let layout: LayoutSnapshot = read_json(path)?;
    let candidates = match args.get_one::<PathBuf>("payload") {
        Some(payload) => nav_candidates(&read_json(payload)?),
        None => layout
            .anchors
            .iter()
            .map(|anchor| NavCandidate::new(anchor.id.clone(), anchor.id.to_string()))
            .collect(),
    };
    let fragment = args.get_one::<String>("fragment").map_or("", String::as_str);
    let pivot = args.get_one::<f64>("pivot").copied().unwrap_or(PageConfig::default().pivot_fraction);

    print_json(&resolve_active(&layout, candidates, fragment, pivot))
}

fn veil_report(progress: f64, hidden: bool) -> VeilReport {
    let style = veil(progress, !hidden);
    VeilReport {
        opacity: style.opacity,
        scale: style.scale,
        blur_px: style.blur_px,
        css: (!hidden).then(|| style.css()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("fetch", args)) => fetch(args).await,
        Some(("active", args)) => active(args),
        Some(("veil", args)) => {
            let progress = args
                .get_one::<f64>("progress")
                .copied()
                .context("--progress is required")?;
            print_json(&veil_report(progress, args.get_flag("hidden")))
        }
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}
