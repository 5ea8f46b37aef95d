mod cache;
mod config;
mod display;
mod normalizer;
mod records;
mod refresh;
mod staleness;
mod time_math;
mod utils;

use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, debug, info};

use cache::CacheLoader;
use config::Config;
use records::{Direction, Schedule};
use refresh::{Fetcher, RefreshCoordinator};

#[derive(Parser)]
struct Args {
    #[clap(long, default_value = "./config")]
    config_dir: PathBuf,
    /// Overrides `cache_path` from the config file
    #[clap(long)]
    cache_path: Option<PathBuf>,
    #[clap(long)]
    refresh_interval: Option<i64>,
    #[clap(long)]
    max_age: Option<i64>,
    /// Run the fetcher before showing anything
    #[clap(long)]
    refresh: bool,
    /// Keep running and check for new data every refresh interval
    #[clap(long)]
    watch: bool,
    #[clap(long, value_enum)]
    direction: Option<Direction>,
    /// Also write the displayed rows as JSON into this directory
    #[clap(long)]
    output_directory: Option<PathBuf>,
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = Config::load(&args.config_dir)?;
    if let Some(cache_path) = &args.cache_path {
        config.cache_path = cache_path.clone();
    }
    if let Some(refresh_interval) = args.refresh_interval {
        config.refresh_interval_secs = refresh_interval;
    }
    if let Some(max_age) = args.max_age {
        config.max_age_secs = max_age;
    }
    let timezone = config.timezone()?;

    let coordinator = RefreshCoordinator::new(
        Fetcher::new(config.fetcher.clone()),
        CacheLoader::new(config.cache_path.clone(), config.schema.clone()),
    );
    info!("Reading departures from {}", coordinator.cache().path().display());

    let mut schedule = coordinator.cache().load();
    let mut force_refresh = args.refresh;
    loop {
        // With no cache at all there is nothing to show until a fetch succeeds
        if force_refresh
            || schedule.is_none()
            || staleness::should_auto_refresh(schedule.as_ref(), config.refresh_interval_secs)
        {
            coordinator.refresh(&mut schedule);
        }
        force_refresh = false;

        print_schedule(schedule.as_ref(), &config, timezone, args.direction);
        if let (Some(output_directory), Some(schedule)) = (&args.output_directory, &schedule) {
            export_schedule(schedule, &config, output_directory)?;
        }

        if !args.watch {
            break;
        }
        let interval = config.refresh_interval_secs.max(1) as u64;
        std::thread::sleep(Duration::from_secs(interval));
    }

    Ok(())
}

fn print_schedule(
    schedule: Option<&Schedule>,
    config: &Config,
    timezone: Tz,
    only: Option<Direction>,
) {
    let Some(schedule) = schedule else {
        println!("No departure data available. Run with --refresh to fetch it.");
        return;
    };

    match staleness::format_last_updated_display(schedule.timestamp(), timezone) {
        Some(time) => println!("Last updated: {time}"),
        None => println!("Last updated: unknown"),
    }
    if staleness::is_stale(Some(schedule), config.max_age_secs) {
        println!("Data may be outdated.");
    }
    if schedule.outbound.is_empty() && schedule.inbound.is_empty() {
        info!("The cache holds no departures");
    }
    for key in schedule.station_metadata.as_object().into_iter().flat_map(|stations| stations.keys()) {
        if let Some(station) = schedule.station(key) {
            debug!("Station {key}: {:?} ({:?})", station.name, station.id);
        }
    }
    println!();

    let tab_order = display::determine_tab_order(Utc::now().with_timezone(&timezone), &config.labels);
    debug!("Afternoon tab order: {}", tab_order.is_afternoon);
    for (direction, label) in &tab_order.tabs {
        if only.is_some_and(|only| only != *direction) {
            continue;
        }
        let rows = display::build_rows(schedule.departures(*direction));
        println!("{}", display::render_table(label, &rows));
    }
}

fn export_schedule(schedule: &Schedule, config: &Config, output_directory: &Path) -> Result<()> {
    let (outbound, inbound) = records::get_direction_data(Some(schedule));
    for (direction, departures) in [(Direction::Outbound, outbound), (Direction::Inbound, inbound)] {
        let rows = display::build_rows(&departures);
        utils::write_json_file(
            &format!("departures_{}", direction.as_str()),
            output_directory,
            &rows,
        )?;
    }
    utils::write_json_file(
        "schedule",
        output_directory,
        normalizer::to_document(schedule, &config.schema),
    )?;
    Ok(())
}
