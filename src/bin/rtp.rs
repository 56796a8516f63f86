//! world-rtp-server binary
//!
//! Spawns a heightmap world, wires the RTP service to it and drives it from
//! operator commands on stdin.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                            | Default  | Description                     |
//! |--------------------------------|----------|---------------------------------|
//! | `RTP_CONFIG`                   | (none)   | Path to a TOML/JSON config file |
//! | `RTP_WORLD`                    | `world`  | World name                      |
//! | `RTP_TERRAIN_SEED`             | `42`     | Terrain seed                    |
//! | `RTP_SEA_LEVEL`                | `62`     | Columns below this are flooded  |
//! | `RTP_SEARCH_SEED`              | (random) | Fixes candidate sampling        |
//! | `RTP__POLICY__COOLDOWN_SECONDS`| `3600`   | Any config key, `__`-separated  |

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use world_rtp::{
    config::RtpConfig,
    console::{ConsoleAgent, ConsoleSink},
    cooldown::SystemClock,
    service::RtpService,
    terrain::{HeightmapParams, HeightmapTerrain},
    types::Vec3,
    world::World,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "world-rtp-server", about = "Random safe teleport service", version)]
struct Args {
    /// Config file (TOML, JSON or YAML)
    #[arg(long, env = "RTP_CONFIG")]
    config: Option<PathBuf>,

    /// World name
    #[arg(long, env = "RTP_WORLD", default_value = "world")]
    world: String,

    /// Terrain seed
    #[arg(long, env = "RTP_TERRAIN_SEED", default_value_t = 42)]
    terrain_seed: u64,

    /// Sea level
    #[arg(long, env = "RTP_SEA_LEVEL", default_value_t = 62)]
    sea_level: i32,

    /// Seed for candidate sampling (random when unset)
    #[arg(long, env = "RTP_SEARCH_SEED")]
    search_seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("world_rtp=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = RtpConfig::load(args.config.as_deref()).context("loading rtp config")?;

    log::info!(
        "Starting world-rtp-server (world='{}', terrain_seed={}, cooldown={}s, warmup={}s, {} tiers)",
        args.world,
        args.terrain_seed,
        config.policy.cooldown_seconds,
        config.policy.warmup_seconds,
        config.tiers.len(),
    );

    let params = HeightmapParams {
        seed: args.terrain_seed,
        sea_level: args.sea_level,
        ..Default::default()
    };
    let terrain = HeightmapTerrain::new(params);
    let spawn = Vec3::new(
        config.search.origin_x,
        terrain.surface_height(config.search.origin_x as i32, config.search.origin_z as i32) as f64 + 1.0,
        config.search.origin_z,
    );

    let world = World::spawn(args.world, Arc::new(terrain));
    let service = RtpService::new(
        config,
        world.clone(),
        Arc::new(ConsoleSink),
        Arc::new(SystemClock),
        args.search_seed,
    );

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let result = ConsoleAgent::new(service, world.clone(), spawn).run(input).await;

    world.shutdown();
    result
}
