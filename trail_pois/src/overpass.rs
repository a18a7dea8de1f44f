use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::gps::GPSBounds;

/// Assembles the Overpass QL query asking for every node, way, and relation tagged with one of
/// the amenities, inside the bounding box. Pure; the same inputs always produce the same string.
pub fn build_query(bounds: &GPSBounds, amenities: &[String], timeout_seconds: u64) -> String {
    // Overpass bounding boxes are south,west,north,east
    let bbox = format!(
        "({},{},{},{})",
        bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
    );
    let mut query = format!("[out:json][timeout:{}];\n(\n", timeout_seconds);
    for kind in ["node", "way", "relation"] {
        for amenity in amenities {
            query.push_str(&format!("  {}[\"amenity\"=\"{}\"]{};\n", kind, amenity, bbox));
        }
    }
    // "geom" attaches the full geometry to ways and relations
    query.push_str(");\nout body geom;\n");
    query
}

/// One element of an Overpass response.
#[derive(Clone, Debug, Deserialize)]
pub struct Element {
    /// "node", "way", or "relation"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Only set for nodes
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Only set for ways and relations, and only because the query asks for geometry
    pub geometry: Option<Vec<ElementPt>>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ElementPt {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
struct Response {
    elements: Vec<Element>,
}

/// Fetches the elements matching a query. The real implementation talks to the Overpass API;
/// tests substitute a canned response.
pub trait PoiFetcher {
    fn fetch(&self, query: &str) -> Result<Vec<Element>>;
}

pub struct OverpassApi {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl OverpassApi {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            // The server gets the full query timeout before answering; don't hang up first.
            timeout: Duration::from_secs(timeout_seconds + 10),
        }
    }
}

impl PoiFetcher for OverpassApi {
    fn fetch(&self, query: &str) -> Result<Vec<Element>> {
        info!("Asking {} for amenities near the trail", self.endpoint);
        let resp: Response = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query)])
            .timeout(self.timeout)
            .send()?
            .error_for_status()
            .with_context(|| format!("querying {}", self.endpoint))?
            .json()?;
        Ok(resp.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::LonLat;

    #[test]
    fn query_covers_all_kinds_and_amenities() {
        let mut bounds = GPSBounds::new();
        bounds.update(LonLat::new(13.0, 55.0));
        bounds.update(LonLat::new(14.0, 56.0));
        let amenities = vec!["cafe".to_string(), "bench".to_string()];

        let query = build_query(&bounds, &amenities, 60);
        assert!(query.starts_with("[out:json][timeout:60];"));
        for clause in [
            "node[\"amenity\"=\"cafe\"](55,13,56,14);",
            "node[\"amenity\"=\"bench\"](55,13,56,14);",
            "way[\"amenity\"=\"cafe\"](55,13,56,14);",
            "relation[\"amenity\"=\"bench\"](55,13,56,14);",
        ] {
            assert!(query.contains(clause), "missing {} in:\n{}", clause, query);
        }
        assert!(query.ends_with("out body geom;\n"));
        assert_eq!(query, build_query(&bounds, &amenities, 60));
    }

    #[test]
    fn elements_deserialize_with_and_without_geometry() {
        let raw = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 55.5, "lon": 13.5,
             "tags": {"amenity": "bench"}},
            {"type": "way", "id": 2,
             "geometry": [{"lat": 55.0, "lon": 13.0}, {"lat": 55.1, "lon": 13.1}],
             "tags": {"amenity": "parking"}},
            {"type": "relation", "id": 3}
        ]}"#;
        let resp: Response = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.elements.len(), 3);
        assert_eq!(resp.elements[0].kind, "node");
        assert_eq!(resp.elements[0].lat, Some(55.5));
        assert_eq!(resp.elements[1].geometry.as_ref().unwrap().len(), 2);
        assert!(resp.elements[2].tags.is_empty());
        assert!(resp.elements[2].geometry.is_none());
    }
}
