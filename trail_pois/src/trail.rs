use anyhow::Result;

use crate::gps::LonLat;

/// Reads the trail's geometry from a GeoJSON file. Returns one coordinate path per line or
/// polygon ring; point features are skipped. Fails if the file is missing, isn't GeoJSON, isn't
/// in WGS84 lon/lat, or has no usable features.
pub fn load_trail(path: &str) -> Result<Vec<Vec<LonLat>>> {
    let raw = fs_err::read_to_string(path)?;
    let geojson = raw.parse::<geojson::GeoJson>()?;
    let features = match geojson {
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::FeatureCollection(collection) => {
            check_crs(path, &collection.foreign_members)?;
            collection.features
        }
        _ => anyhow::bail!("Unexpected geojson in {}: {:?}", path, geojson),
    };

    let mut paths = Vec::new();
    for feature in features {
        if let Some(geom) = feature.geometry {
            scrape_geometry(geom.value, &mut paths);
        }
    }
    if paths.is_empty() {
        bail!("{} has no line or polygon features to buffer", path);
    }
    Ok(paths)
}

fn scrape_geometry(value: geojson::Value, paths: &mut Vec<Vec<LonLat>>) {
    match value {
        geojson::Value::LineString(pts) => {
            paths.push(to_lonlats(pts));
        }
        geojson::Value::MultiLineString(lines) => {
            for pts in lines {
                paths.push(to_lonlats(pts));
            }
        }
        geojson::Value::Polygon(rings) => {
            for ring in rings {
                paths.push(to_lonlats(ring));
            }
        }
        geojson::Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    paths.push(to_lonlats(ring));
                }
            }
        }
        geojson::Value::GeometryCollection(list) => {
            for geometry in list {
                scrape_geometry(geometry.value, paths);
            }
        }
        _ => {
            warn!("Skipping a trail feature that isn't a line or polygon");
        }
    }
}

fn to_lonlats(pts: Vec<Vec<f64>>) -> Vec<LonLat> {
    pts.into_iter()
        .map(|pair| LonLat::new(pair[0], pair[1]))
        .collect()
}

// GeoJSON is WGS84 by definition, but files produced by older tools sometimes carry a legacy
// "crs" member naming something else. Reject those instead of buffering in the wrong units.
fn check_crs(path: &str, foreign_members: &Option<geojson::JsonObject>) -> Result<()> {
    let name = foreign_members
        .as_ref()
        .and_then(|fm| fm.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str());
    if let Some(name) = name {
        if !matches!(
            name,
            "urn:ogc:def:crs:OGC:1.3:CRS84" | "urn:ogc:def:crs:EPSG::4326" | "EPSG:4326" | "CRS84"
        ) {
            bail!("{} declares CRS {}; only WGS84 lon/lat is supported", path, name);
        }
    }
    Ok(())
}
