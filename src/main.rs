use anyhow::{anyhow, Result};
use fra_atlas::{config, data, engine, raster, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render static PNG snapshots of the claims map
    Snapshot {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Claim-type filter to apply before rendering (all|ifr|cr|cfr)
        #[arg(long)]
        filter: Option<String>,
        /// Center the view on this village or claim id before rendering
        #[arg(long)]
        search: Option<String>,
    },
    /// Serve the interactive claims map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Snapshot {
            config,
            filter,
            search,
        } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let claims = data::load_claims(&app_config)?;

            let mut map_engine = engine::MapEngine::new(claims, &app_config.map);
            {
                let map = app_config.map.clone();
                map_engine.mount(move || Ok(raster::RasterSurface::new(&map)));
            }
            if let Some(filter) = filter {
                map_engine.set_filter(filter);
            }
            if let Some(query) = search {
                map_engine.search(query);
            }
            for event in map_engine.drain_events() {
                info!("{}", event);
            }

            let surface = map_engine
                .surface()
                .ok_or_else(|| anyhow!("Map engine failed to mount"))?;
            surface.write_snapshots(&app_config.output)?;
            info!(
                "Snapshots written to {:?} for zoom {}..={}",
                app_config.output.snapshot_dir,
                app_config.output.min_zoom,
                app_config.output.max_zoom
            );
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let claims = data::load_claims(&app_config)?;
            server::start_server(app_config, claims).await?;
        }
    }

    Ok(())
}
