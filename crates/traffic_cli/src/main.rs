//! Command-line interface over traffic_core: route congestion analysis,
//! density heatmaps, and ride matching.
//!
//! Every subcommand prints exactly one JSON document to stdout. Failures
//! print `{"error": <message>}` to stdout and exit non-zero; logs go to
//! stderr so stdout stays machine-readable for the calling process.

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use traffic_core::geo::GeoPoint;
use traffic_core::geocode::{NominatimGeocoder, PUBLIC_NOMINATIM_ENDPOINT};
use traffic_core::grid::DEFAULT_CELL_SIZE_DEG;
use traffic_core::rides::{self, DatasetSpec, RideDataset};
use traffic_core::routing::{OsrmRouteProvider, PUBLIC_OSRM_ENDPOINT};
use traffic_core::services::{
    HeatmapService, MatchQuery, RideMatchService, RouteAnalysisConfig, RouteCongestionService,
    DEFAULT_CORRIDOR_MARGIN_DEG, DEFAULT_MATCH_RADIUS_KM, DEFAULT_ROAD_CAPACITY,
};
use traffic_core::telemetry;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "traffic_cli",
    about = "Route congestion analysis, density heatmaps, and ride matching"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a driving route and classify congestion along it
    #[command(allow_negative_numbers = true)]
    Route {
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        /// JSON file with the vehicle position batch to count against
        #[arg(long)]
        telemetry: Option<PathBuf>,
        /// Nominal corridor capacity (the density denominator)
        #[arg(long, default_value_t = DEFAULT_ROAD_CAPACITY)]
        road_capacity: u64,
        /// Corridor margin around the route bounding box, in degrees
        #[arg(long, default_value_t = DEFAULT_CORRIDOR_MARGIN_DEG)]
        margin: f64,
        /// OSRM endpoint
        #[arg(long, default_value = PUBLIC_OSRM_ENDPOINT)]
        osrm_endpoint: String,
    },
    /// Aggregate a position batch into a density heatmap
    Heatmap {
        /// JSON file with the vehicle position batch
        input: PathBuf,
        /// Cell edge length in degrees
        #[arg(long, default_value_t = DEFAULT_CELL_SIZE_DEG)]
        cell_size: f64,
    },
    /// Find carpooling offers with a pickup near a place
    Rides {
        /// Free-text place name to search around
        place: String,
        /// Match radius in kilometres
        #[arg(long, default_value_t = DEFAULT_MATCH_RADIUS_KM)]
        max_distance_km: f64,
        /// Ride dataset CSV
        #[arg(long, default_value = "ridesharing_data.csv")]
        dataset: PathBuf,
        /// Nominatim endpoint
        #[arg(long, default_value = PUBLIC_NOMINATIM_ENDPOINT)]
        geocoder_endpoint: String,
    },
    /// Generate a synthetic ride dataset CSV
    GenerateRides {
        /// Number of rides
        #[arg(long, default_value_t = 1000)]
        count: usize,
        /// Output file path
        #[arg(long, default_value = "ridesharing_data.csv")]
        output: PathBuf,
        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },
}

// ── subcommand dispatch ────────────────────────────────────────────

fn run(command: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match command {
        Commands::Route {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            telemetry,
            road_capacity,
            margin,
            osrm_endpoint,
        } => {
            let samples = match telemetry {
                Some(path) => telemetry::load_samples(&path)?,
                None => Vec::new(),
            };
            let provider = Box::new(OsrmRouteProvider::new(&osrm_endpoint));
            let config = RouteAnalysisConfig::default()
                .with_road_capacity(road_capacity)
                .with_corridor_margin_deg(margin);
            let service = RouteCongestionService::with_config(provider, config);
            let report = service.compute_route(
                GeoPoint::new(start_lat, start_lon),
                GeoPoint::new(end_lat, end_lon),
                &samples,
            )?;
            Ok(serde_json::to_string(&report)?)
        }
        Commands::Heatmap { input, cell_size } => {
            let samples = telemetry::load_samples(&input)?;
            let service = HeatmapService::new(cell_size)?;
            let heatmap = service.build_heatmap(&samples)?;
            Ok(serde_json::to_string(&heatmap)?)
        }
        Commands::Rides {
            place,
            max_distance_km,
            dataset,
            geocoder_endpoint,
        } => {
            let dataset = RideDataset::from_csv_path(&dataset)?;
            let geocoder = Box::new(NominatimGeocoder::new(&geocoder_endpoint));
            let service = RideMatchService::new(geocoder);
            let query = MatchQuery::new(&place).with_max_distance_km(max_distance_km);
            let matches = service.find_matches(&query, &dataset)?;
            Ok(serde_json::to_string(&matches)?)
        }
        Commands::GenerateRides {
            count,
            output,
            seed,
        } => {
            let mut spec = DatasetSpec::default().with_num_rides(count);
            if let Some(seed) = seed {
                spec = spec.with_seed(seed);
            }
            let offers = rides::generate_offers(&spec);
            rides::write_csv_path(&offers, &output)?;
            Ok(serde_json::json!({
                "generated": offers.len(),
                "path": output.display().to_string(),
            })
            .to_string())
        }
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            println!("{}", error_json(&err.to_string()));
            exit(1);
        }
    }
}
