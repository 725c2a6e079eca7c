//! Headless inspection tool: load a point cloud and print its stats.

use std::path::PathBuf;

use clap::Parser;

use cloudview_io::{CloudFetcher, CloudSource};

#[derive(Parser)]
#[command(about = "Print basic information about a point cloud file")]
struct Args {
    /// Point cloud file (PLY, LAS, LAZ or PCD)
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let loaded = CloudFetcher.fetch(&args.path).await?;

    println!("name:   {}", loaded.name);
    println!("points: {}", loaded.point_count());
    match &loaded.bounds {
        Some(bounds) => {
            let center = bounds.center();
            let size = bounds.size();
            println!(
                "bounds: min ({:.3}, {:.3}, {:.3})  max ({:.3}, {:.3}, {:.3})",
                bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
            );
            println!(
                "center: ({:.3}, {:.3}, {:.3})  extent: ({:.3}, {:.3}, {:.3})",
                center.x, center.y, center.z, size.x, size.y, size.z
            );
        }
        None => println!("bounds: empty cloud"),
    }

    Ok(())
}
