use std::cell::RefCell;
use std::env;

use clap::{Parser, Subcommand, ValueEnum};
use foundation::time::SystemClock;
use layers::viewport::ViewportConfig;
use locations::store::{LocationStore, load};
use motion::preview::preview_animator;
use reqwest::Client;
use tools::{
    API_BASE_ENV, DEFAULT_API_BASE, ReqwestFetcher, phase_table, render_locations,
    render_phase_table, render_viewport_path, viewport_path,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect the freemap location feed and scroll animation")]
struct Args {
    /// Location API base URL (default: $FREEMAP_API_BASE or the public deployment)
    #[arg(long)]
    api_base: Option<String>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MapKind {
    Background,
    Featured,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the location list
    Locations,

    /// Print phase opacities across the scroll range
    Phases {
        /// Number of intervals between progress 0 and 1
        #[arg(long, default_value_t = 20)]
        steps: u32,
    },

    /// Print the map center and zoom across the scroll range
    Viewport {
        #[arg(long, default_value_t = 10)]
        steps: u32,

        #[arg(long, value_enum, default_value_t = MapKind::Background)]
        map: MapKind,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let api_base = args.api_base.unwrap_or_else(|| {
        env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
    });

    match args.command {
        Command::Locations => {
            let fetcher = ReqwestFetcher::new(Client::new(), &api_base);
            let store = RefCell::new(LocationStore::new(SystemClock));
            let records = load(&store, &fetcher, false).await?;
            info!(
                url = fetcher.url(),
                count = records.len(),
                "fetched locations"
            );
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print!("{}", render_locations(&records));
            }
        }
        Command::Phases { steps } => {
            let rows = phase_table(&preview_animator()?, steps);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", render_phase_table(&rows));
            }
        }
        Command::Viewport { steps, map } => {
            let config = match map {
                MapKind::Background => ViewportConfig::background(),
                MapKind::Featured => ViewportConfig::featured(),
            };
            let rows = viewport_path(&config, steps);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", render_viewport_path(&rows));
            }
        }
    }

    Ok(())
}
