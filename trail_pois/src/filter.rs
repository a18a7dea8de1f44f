use std::collections::BTreeMap;

use geo::{Centroid, Intersects};

use crate::gps::LonLat;
use crate::overpass::Element;

// The kinds of shelter a hiker can actually use. Plain amenity=shelter also covers bus shelters
// and the like, which aren't worth flagging along a trail.
const KEPT_SHELTER_TYPES: [&str; 4] = ["picnic_shelter", "weather_shelter", "lean_to", "basic_hut"];

/// A point of interest that survived filtering: a representative point plus the element's
/// original tags.
#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    pub point: LonLat,
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterOutcome {
    Keep(Poi),
    Skip(SkipReason),
}

/// Why one element didn't make it into the output. Skips never abort the run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SkipReason {
    UnwantedShelterType,
    /// A way or relation the server returned without geometry attached
    MissingGeometry,
    /// A ring with fewer than 3 distinct coordinates
    DegenerateGeometry,
    UnknownElementType,
    OutsideBuffer,
}

/// Decides what happens to one Overpass element. Pure; no network or filesystem involved.
pub fn filter_element(el: &Element, buffer: &geo::MultiPolygon<f64>) -> FilterOutcome {
    if !keep_amenity(&el.tags) {
        return FilterOutcome::Skip(SkipReason::UnwantedShelterType);
    }
    let point = match representative_point(el) {
        Ok(pt) => pt,
        Err(reason) => return FilterOutcome::Skip(reason),
    };
    // Deliberately boundary-inclusive; a bench exactly on the buffer's edge still counts.
    if !buffer.intersects(&geo::Point::from(point)) {
        return FilterOutcome::Skip(SkipReason::OutsideBuffer);
    }
    FilterOutcome::Keep(Poi {
        point,
        tags: el.tags.clone(),
    })
}

fn keep_amenity(tags: &BTreeMap<String, String>) -> bool {
    if tags.get("amenity").map(|x| x == "shelter").unwrap_or(false) {
        return tags
            .get("shelter_type")
            .map(|x| KEPT_SHELTER_TYPES.contains(&x.as_str()))
            .unwrap_or(false);
    }
    true
}

// Nodes are already points. Ways and relations reduce to the centroid of the polygon formed by
// their geometry, closing the ring if needed.
fn representative_point(el: &Element) -> Result<LonLat, SkipReason> {
    match el.kind.as_str() {
        "node" => match (el.lon, el.lat) {
            (Some(lon), Some(lat)) => Ok(LonLat::new(lon, lat)),
            _ => Err(SkipReason::MissingGeometry),
        },
        "way" | "relation" => {
            let geometry = match &el.geometry {
                Some(pts) => pts,
                None => return Err(SkipReason::MissingGeometry),
            };
            let mut coords: Vec<geo::Coordinate<f64>> = geometry
                .iter()
                .map(|pt| geo::Coordinate {
                    x: pt.lon,
                    y: pt.lat,
                })
                .collect();
            coords.dedup();
            if coords.first() == coords.last() {
                coords.pop();
            }
            if coords.len() < 3 {
                return Err(SkipReason::DegenerateGeometry);
            }
            coords.push(coords[0]);
            let polygon = geo::Polygon::new(geo::LineString(coords), Vec::new());
            match polygon.centroid() {
                Some(pt) => Ok(LonLat::new(pt.x(), pt.y())),
                None => Err(SkipReason::DegenerateGeometry),
            }
        }
        _ => Err(SkipReason::UnknownElementType),
    }
}
