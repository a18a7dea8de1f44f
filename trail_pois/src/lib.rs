//! Finds amenities near a hiking trail, using OSM's Overpass API.
//!
//! The pipeline is a single forward pass: load the trail's GeoJSON, buffer it at a fixed radius,
//! ask Overpass for amenities inside the buffer's bounding box, keep the ones that actually fall
//! inside the buffer itself, and write them back out as a GeoJSON FeatureCollection of points.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use structopt::StructOpt;

pub mod buffer;
pub mod filter;
pub mod gps;
pub mod network;
pub mod overpass;
pub mod trail;

use filter::{FilterOutcome, Poi};
use overpass::PoiFetcher;

/// Everything configurable about one run.
#[derive(Clone, Debug, StructOpt)]
pub struct Options {
    /// GeoJSON file with the trail geometry, in WGS84 longitude/latitude
    #[structopt(long, default_value = "data/trail.geojson")]
    pub input: String,
    /// Where to write the amenities found, as a GeoJSON FeatureCollection of points
    #[structopt(long, default_value = "data/amenities.geojson")]
    pub output: String,
    /// How far from the trail an amenity may be, in meters
    #[structopt(long, default_value = "250")]
    pub buffer_meters: f64,
    /// The amenity values to ask Overpass for
    #[structopt(
        long,
        use_delimiter = true,
        default_value = "cafe,restaurant,pub,fast_food,biergarten,drinking_water,toilets,shelter,bench,picnic_table,parking"
    )]
    pub amenities: Vec<String>,
    /// The Overpass interpreter endpoint
    #[structopt(long, default_value = "https://overpass-api.de/api/interpreter")]
    pub endpoint: String,
    /// The server-side timeout for the Overpass query, in seconds
    #[structopt(long, default_value = "60")]
    pub timeout_seconds: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            input: "data/trail.geojson".to_string(),
            output: "data/amenities.geojson".to_string(),
            buffer_meters: 250.0,
            amenities: vec![
                "cafe",
                "restaurant",
                "pub",
                "fast_food",
                "biergarten",
                "drinking_water",
                "toilets",
                "shelter",
                "bench",
                "picnic_table",
                "parking",
            ]
            .into_iter()
            .map(|x| x.to_string())
            .collect(),
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// What one run did.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub num_kept: usize,
    pub num_skipped: usize,
}

/// Runs the whole pipeline. Problems with the input file, the network, or the output file are
/// fatal; a single element that can't be handled is skipped.
pub fn run(opts: &Options, fetcher: &dyn PoiFetcher) -> Result<Summary> {
    let paths = trail::load_trail(&opts.input)?;
    info!("Loaded {} trail features from {}", paths.len(), opts.input);

    let buffer = buffer::buffer_trail(&paths, opts.buffer_meters)?;
    let query = overpass::build_query(&buffer.bounds, &opts.amenities, opts.timeout_seconds);
    let elements = fetcher.fetch(&query)?;
    info!("Overpass returned {} elements", elements.len());

    let mut pois = Vec::new();
    let mut num_skipped = 0;
    for el in &elements {
        match filter::filter_element(el, &buffer.polygons) {
            FilterOutcome::Keep(poi) => {
                pois.push(poi);
            }
            FilterOutcome::Skip(reason) => {
                debug!("Skipping a {}: {:?}", el.kind, reason);
                num_skipped += 1;
            }
        }
    }

    write_geojson(&opts.output, &pois)?;
    println!(
        "Found {} nearby amenities within {}m of the trail",
        pois.len(),
        opts.buffer_meters
    );
    Ok(Summary {
        num_kept: pois.len(),
        num_skipped,
    })
}

// One Point feature per POI, with the element's original tags as properties.
fn write_geojson(path: &str, pois: &[Poi]) -> Result<()> {
    let mut features = Vec::new();
    for poi in pois {
        let mut feature = geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                poi.point.longitude,
                poi.point.latitude,
            ]))),
            id: None,
            properties: Some(geojson::JsonObject::new()),
            foreign_members: None,
        };
        for (key, value) in &poi.tags {
            feature.set_property(key.clone(), value.clone());
        }
        features.push(feature);
    }
    let gj = geojson::GeoJson::FeatureCollection(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }
    fs_err::write(path, serde_json::to_string_pretty(&gj)?)
        .with_context(|| format!("writing {}", path))?;
    Ok(())
}
