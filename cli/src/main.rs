//! Command-line tools for working with a trail: finding nearby amenities, and sanity-checking
//! the trail network itself.

#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use trail_pois::overpass::OverpassApi;
use trail_pois::{buffer, network, overpass, trail, Options};

#[derive(StructOpt)]
#[structopt(name = "trail_pois", about = "Tools for finding points of interest near a trail")]
enum Command {
    /// Buffer the trail, ask Overpass for amenities, and write the ones inside the buffer as
    /// GeoJSON
    FindPois {
        #[structopt(flatten)]
        opts: Options,
    },
    /// Print the Overpass query find-pois would send, without sending it
    DumpQuery {
        #[structopt(flatten)]
        opts: Options,
    },
    /// Check whether the trail's features form one connected network
    CheckNetwork {
        /// GeoJSON file with the trail geometry
        #[structopt()]
        input: String,
        /// If set, write a FeatureCollection with every feature tagged by its island
        #[structopt(long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    setup_logger();

    match Command::from_args() {
        Command::FindPois { opts } => {
            let api = OverpassApi::new(opts.endpoint.clone(), opts.timeout_seconds);
            trail_pois::run(&opts, &api)?;
        }
        Command::DumpQuery { opts } => dump_query(&opts)?,
        Command::CheckNetwork { input, output } => check_network(input, output)?,
    }
    Ok(())
}

/// Intercept messages from the `log` crate and print them to STDOUT, filtered by RUST_LOG.
fn setup_logger() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}

fn dump_query(opts: &Options) -> Result<()> {
    let paths = trail::load_trail(&opts.input)?;
    let buffer = buffer::buffer_trail(&paths, opts.buffer_meters)?;
    println!(
        "{}",
        overpass::build_query(&buffer.bounds, &opts.amenities, opts.timeout_seconds)
    );
    Ok(())
}

fn check_network(input: String, output: Option<String>) -> Result<()> {
    let paths = trail::load_trail(&input)?;
    let islands = network::find_islands(&paths);
    if islands.len() == 1 {
        println!("Found 1 island; the trail network is fully connected");
    } else {
        println!("Found {} islands", islands.len());
        for (id, island) in islands.iter().enumerate() {
            info!("Island {} has {} features", id, island.len());
        }
    }
    if let Some(path) = output {
        network::write_islands(&path, &paths, &islands)?;
        println!("Wrote {}", path);
    }
    Ok(())
}
