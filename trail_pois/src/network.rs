use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::gps::{HashablePt2D, LonLat};

/// Partitions the trail's paths into connected components ("islands"), joined wherever two paths
/// share an endpoint coordinate exactly. Returns the islands largest-first; each entry is a list
/// of indices into `paths`. A well-mapped trail network comes back as a single island.
pub fn find_islands(paths: &[Vec<LonLat>]) -> Vec<Vec<usize>> {
    // A simple floodfill, assuming every path is walkable in both directions
    let mut next_paths: HashMap<HashablePt2D, Vec<usize>> = HashMap::new();
    for (idx, path) in paths.iter().enumerate() {
        if path.is_empty() {
            continue;
        }
        next_paths.entry(path[0].to_hashable()).or_default().push(idx);
        next_paths
            .entry(path.last().unwrap().to_hashable())
            .or_default()
            .push(idx);
    }

    let mut partitions: Vec<Vec<usize>> = Vec::new();
    let mut unvisited: HashSet<usize> =
        (0..paths.len()).filter(|idx| !paths[*idx].is_empty()).collect();
    while !unvisited.is_empty() {
        let mut queue = vec![*unvisited.iter().next().unwrap()];
        let mut current = Vec::new();
        while let Some(idx) = queue.pop() {
            if !unvisited.remove(&idx) {
                continue;
            }
            current.push(idx);
            for endpoint in [paths[idx][0], *paths[idx].last().unwrap()] {
                if let Some(others) = next_paths.get(&endpoint.to_hashable()) {
                    queue.extend(others.iter().copied());
                }
            }
        }
        current.sort();
        partitions.push(current);
    }
    partitions.sort_by_key(|island| (Reverse(island.len()), island[0]));
    partitions
}

/// Renders every path as a LineString feature tagged with the id of its island, so the
/// disconnected bits can be eyeballed on a map.
pub fn write_islands(path: &str, paths: &[Vec<LonLat>], islands: &[Vec<usize>]) -> Result<()> {
    let mut features = Vec::new();
    for (id, island) in islands.iter().enumerate() {
        for idx in island {
            let line: Vec<Vec<f64>> = paths[*idx]
                .iter()
                .map(|pt| vec![pt.longitude, pt.latitude])
                .collect();
            let mut feature = geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::LineString(line))),
                id: None,
                properties: None,
                foreign_members: None,
            };
            feature.set_property("island", id);
            features.push(feature);
        }
    }
    let gj = geojson::GeoJson::FeatureCollection(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    fs_err::write(path, serde_json::to_string_pretty(&gj)?)?;
    Ok(())
}
