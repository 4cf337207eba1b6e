//! Example: Query one row of elevations from the service.
//!
//! Usage: cargo run --example query_row -- <north> <south> <east> <west> [points]

use geoalt_terrain::{
    parse_row, BoundingBox, ElevationQuery, ElevationService, HttpElevationService, SampleGrid,
};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!("Usage: {} <north> <south> <east> <west> [points]", args[0]);
        eprintln!("Example: {} 42.585322 42.581024 8.72734 8.720999 10", args[0]);
        std::process::exit(1);
    }

    let coord = |i: usize| -> f64 { args[i].parse().expect("Invalid coordinate") };
    let points: usize = args
        .get(5)
        .map(|s| s.parse().expect("Invalid point count"))
        .unwrap_or(10);

    let bbox =
        BoundingBox::new(coord(1), coord(2), coord(3), coord(4)).expect("Invalid bounding box");
    let grid = SampleGrid::new(bbox, 2, points);

    let service = HttpElevationService::new().expect("Failed to create HTTP client");
    let query = ElevationQuery::for_row(&grid, 0);
    let url = query.to_url(service.endpoint());
    println!("Requesting {} points along the north edge ({} bytes)...", points, url.len());

    let start = Instant::now();
    let body = match service.get(0, &url) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match parse_row(&query, &body) {
        Ok(samples) => {
            for s in &samples {
                println!(
                    "  ({:.6}, {:.6}): {:.2} m (acc {:.2})",
                    s.lat, s.lon, s.elevation, s.accuracy
                );
            }
            println!("Done in {:.2}s", start.elapsed().as_secs_f64());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
