//! Terminal dashboard.
//!
//! ```text
//! dashboard [--city NAME]... [--product NAME]... [--export PATH]
//! ```
//!
//! Repeat `--city` / `--product` to select several values; omitted
//! dimensions include everything.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use bakery_analytics::{Analytics, RowFilter};
use clap::Parser;

/// Bakery sales dashboard
#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Print KPIs, charts and the city table for bakery sales")]
struct Args {
    /// Only include this city (repeatable)
    #[arg(long = "city", value_name = "NAME")]
    cities: Vec<String>,

    /// Only include this product (repeatable)
    #[arg(long = "product", value_name = "NAME")]
    products: Vec<String>,

    /// Write the filtered rows to a CSV file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let analytics = Analytics::from_env()?;
    log::info!("{}", analytics);

    let mut filter = RowFilter::new();
    if !args.cities.is_empty() {
        filter = filter.cities(&args.cities);
    }
    if !args.products.is_empty() {
        filter = filter.products(&args.products);
    }

    let view = analytics.dashboard(&filter);
    print!("{}", view.render_text());

    if let Some(path) = args.export {
        view.write_csv(BufWriter::new(File::create(&path)?))?;
        log::info!("Filtered data written to {}", path.display());
    }
    Ok(())
}
