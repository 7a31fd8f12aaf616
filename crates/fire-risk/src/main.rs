//! Offline Fire Risk Assessment CLI
//!
//! Scores one coordinate against a FIRMS CSV export on disk.
//!
//! Usage:
//!   assess-fire-risk --hotspots data/firms_viirs_aus_sample.csv \
//!                    --lat -33.87 --lon 151.21 --radius-km 50

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use fire_risk::hotspot::read_firms_csv;
use fire_risk::{assess, RiskQuery, DEFAULT_RADIUS_KM};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "assess-fire-risk",
    about = "Assess bushfire exposure of a location from a FIRMS CSV export"
)]
struct Args {
    /// Path to FIRMS area CSV file
    #[arg(short = 'f', long)]
    hotspots: PathBuf,

    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Search radius in km
    #[arg(short, long, default_value_t = DEFAULT_RADIUS_KM)]
    radius_km: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let query = RiskQuery::new(args.lat, args.lon, Some(args.radius_km))?;
    let hotspots = read_firms_csv(&args.hotspots)?;

    let assessment = assess(query.target, &hotspots, query.radius_km, Utc::now());
    info!(
        "{}: {} risk ({:.2}), {} fires within {} km",
        query.target,
        assessment.risk_level,
        assessment.risk_score,
        assessment.nearby_fires,
        query.radius_km
    );

    println!("{}", serde_json::to_string_pretty(&assessment)?);

    Ok(())
}
