//! CLI tool to plan routes and find stops through a tripstop server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tripstop_cli::client::StopsQuery;
use tripstop_cli::{report, ApiClient};

/// Plan road trips and find stops along the way
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// tripstop server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a route between two places
    Route {
        /// Origin address or "lat,lng"
        origin: String,
        /// Destination address or "lat,lng"
        destination: String,
        /// Travel mode (driving, walking, bicycling, transit)
        #[arg(long, default_value = "DRIVE")]
        mode: String,
    },
    /// Compute a route through intermediate waypoints
    Waypoints {
        origin: String,
        destination: String,
        /// Intermediate stop, repeatable
        #[arg(long = "via", required = true)]
        via: Vec<String>,
        #[arg(long, default_value = "DRIVE")]
        mode: String,
    },
    /// Plan a driving route, then search for stops along it
    Stops {
        origin: String,
        destination: String,
        /// What to look for, e.g. "gas station"
        #[arg(long, short)]
        query: String,
        /// Only places open now
        #[arg(long)]
        open_now: bool,
        /// Result count hint for the provider
        #[arg(long)]
        max: Option<u32>,
        /// Places to list when no curated plan is available
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let client = ApiClient::new(&args.url)?;

    match args.command {
        Command::Route {
            origin,
            destination,
            mode,
        } => {
            let route = client.plan_route(&origin, &destination, &mode)?;
            print!("{}", report::route_summary(&route));
        }
        Command::Waypoints {
            origin,
            destination,
            via,
            mode,
        } => {
            let route = client.plan_route_with_waypoints(&origin, &destination, &via, &mode)?;
            print!("{}", report::waypoint_summary(&route));
        }
        Command::Stops {
            origin,
            destination,
            query,
            open_now,
            max,
            limit,
        } => {
            println!("Planning route from {} to {}...", origin, destination);
            let route = client.plan_route(&origin, &destination, "DRIVE")?;
            println!("  {} in {}", route.distance, route.duration);

            let summary = client.search_stops(&StopsQuery {
                text_query: &query,
                encoded_polyline: &route.encoded_polyline,
                origin: route.origin_coord,
                route_duration_seconds: route.duration_seconds,
                open_now,
                max_result_count: max,
            })?;
            print!("{}", report::stops_summary(&summary, limit));
        }
    }

    Ok(())
}
