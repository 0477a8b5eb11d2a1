use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use config::Config;
use explorer::{MapExplorer, MapPreset};
use shared::format::{format_date, format_time};
use store::{Catalog, DataStore, Source};
use widgets::{ConsoleSurface, DetailPanel};

mod carousel;
mod cli;
mod config;
mod explorer;
mod store;
mod widgets;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    let source = Source::parse(&args.source, config.http_timeout())?;
    let store = DataStore::new(source);
    let catalog = store
        .load()
        .await
        .ok_or_else(|| anyhow!("failed to load capture data from {}", args.source))?;

    match args.cmd {
        Command::Summary => summary(&store),
        Command::Show { id } => match store.get_capture(&id) {
            Some(record) => {
                ConsoleSurface::stdout().show_details(&shared::CaptureDetails::from_record(record))
            }
            None => log::warn!("No metadata found for capture: {}", id),
        },
        Command::Explore { preset } => run_explorer(catalog, preset).await?,
        Command::Carousel { width } => run_carousel(&catalog, &config, width).await,
    }

    Ok(())
}

fn summary(store: &DataStore) {
    let Some(catalog) = store.catalog() else {
        return;
    };
    println!("{} captures", store.capture_count().unwrap_or_default());
    for (region, _) in catalog.regions() {
        let sites = store.locations_for(region);
        let captures: usize = sites.iter().map(|site| site.capture_ids().len()).sum();
        println!("  {}: {} sites, {} captures", region, sites.len(), captures);
    }

    let mut locations: Vec<u32> = store
        .all_capture_ids()
        .iter()
        .filter(|id| catalog.is_campus_capture(id))
        .filter_map(|id| shared::format::parse_campus_id(id))
        .map(|campus| campus.location)
        .collect();
    locations.sort_unstable();
    locations.dedup();
    for location in locations {
        let ids = catalog.captures_at_campus_location(location);
        println!("    loc{}: {}", location, ids.join(", "));
    }

    if let Some((first, last)) = catalog.capture_span() {
        println!(
            "  captured {} {} to {} {}",
            format_date(first.timestamp.as_ref()),
            format_time(first.timestamp.as_ref()),
            format_date(last.timestamp.as_ref()),
            format_time(last.timestamp.as_ref())
        );
    }
}

async fn run_explorer(catalog: Arc<Catalog>, preset: MapPreset) -> Result<()> {
    let mut surface = ConsoleSurface::stdout();
    let (mut map, effects) = MapExplorer::init(catalog);
    explorer::apply(&map, effects, &mut surface);

    if preset != map.preset() {
        let effects = map.dispatch(explorer::ExplorerEvent::PresetSelected(preset));
        explorer::apply(&map, effects, &mut surface);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match cli::parse_explorer_command(&line) {
            Ok(event) => {
                let effects = map.dispatch(event);
                explorer::apply(&map, effects, &mut surface);
            }
            Err(e) => log::warn!("{}", e),
        }
    }
    log::info!(
        "Explorer closed on {} ({} captures in strip)",
        map.selected().unwrap_or("nothing"),
        map.strip().map_or(0, <[String]>::len)
    );
    Ok(())
}

async fn run_carousel(catalog: &Catalog, config: &Config, width: u32) {
    let mut rng = rand::rng();
    let (grid, initial) = carousel::GridCarousel::init(catalog, config.sample_size, width, &mut rng);
    log::info!(
        "Showing {} of {} captures in the grid",
        grid.displayed_ids().len(),
        grid.all_ids().len()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match cli::parse_carousel_command(&line) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    log::error!("stdin read error: {}", e);
                    break;
                }
            }
        }
    });

    let mut surface = ConsoleSurface::stdout();
    let grid = carousel::run(
        grid,
        initial,
        rx,
        &mut surface,
        &mut rng,
        config.autoplay_period(),
    )
    .await;
    log::info!(
        "Carousel stopped on {} ({:?}, {} columns)",
        grid.main_image().unwrap_or("no image"),
        grid.playback(),
        grid.columns()
    );
}
