use std::f64::consts::{FRAC_PI_2, PI};

use anyhow::Result;
use geo::BooleanOps;

use crate::gps::{GPSBounds, LonLat, Pt2D};

// How many chords approximate a semicircular end cap.
const ARC_STEPS: usize = 16;

/// The region within the configured distance of the trail, as one (possibly multi-part) polygon
/// in geographic coordinates, plus its bounding box.
pub struct TrailBuffer {
    pub polygons: geo::MultiPolygon<f64>,
    pub bounds: GPSBounds,
}

/// Buffers every trail path at a fixed radius and unions the pieces together. The buffering
/// happens in a flat plane measured in meters, anchored at the trail's bounding box; the result
/// is converted back to lon/lat.
pub fn buffer_trail(paths: &[Vec<LonLat>], buffer_meters: f64) -> Result<TrailBuffer> {
    if buffer_meters < 0.0 {
        bail!("can't buffer the trail by {}m", buffer_meters);
    }
    let mut trail_bounds = GPSBounds::new();
    let mut any = false;
    for path in paths {
        for pt in path {
            trail_bounds.update(*pt);
            any = true;
        }
    }
    if !any {
        bail!("the trail has no coordinates");
    }

    let mut pieces: Vec<geo::Polygon<f64>> = Vec::new();
    for path in paths {
        let mut pts: Vec<Pt2D> = path.iter().map(|pt| pt.to_pt(&trail_bounds)).collect();
        pts.dedup();
        if pts.is_empty() {
            continue;
        }
        if pts.len() == 1 {
            pieces.push(circle(pts[0], buffer_meters));
        } else {
            for pair in pts.windows(2) {
                pieces.push(capsule(pair[0], pair[1], buffer_meters));
            }
        }
    }

    // Union everything into one multipolygon, one piece at a time.
    let mut result = geo::MultiPolygon(vec![pieces.pop().unwrap()]);
    for piece in pieces {
        result = result.union(&piece.into());
    }

    let polygons = geo::MultiPolygon(
        result
            .into_iter()
            .map(|poly| polygon_to_gps(&poly, &trail_bounds))
            .collect(),
    );
    let mut bounds = GPSBounds::new();
    for poly in &polygons.0 {
        for c in &poly.exterior().0 {
            bounds.update(LonLat::new(c.x, c.y));
        }
    }
    Ok(TrailBuffer { polygons, bounds })
}

// A rectangle around the segment, with semicircular caps at both endpoints.
fn capsule(a: Pt2D, b: Pt2D, radius: f64) -> geo::Polygon<f64> {
    let angle = (b.y() - a.y()).atan2(b.x() - a.x());
    let mut pts = Vec::new();
    for i in 0..=ARC_STEPS {
        let theta = angle - FRAC_PI_2 + (i as f64) / (ARC_STEPS as f64) * PI;
        pts.push(b.project_away(radius, theta));
    }
    for i in 0..=ARC_STEPS {
        let theta = angle + FRAC_PI_2 + (i as f64) / (ARC_STEPS as f64) * PI;
        pts.push(a.project_away(radius, theta));
    }
    ring(pts)
}

fn circle(center: Pt2D, radius: f64) -> geo::Polygon<f64> {
    let num_pts = 2 * ARC_STEPS;
    let mut pts = Vec::new();
    for i in 0..num_pts {
        pts.push(center.project_away(radius, (i as f64) / (num_pts as f64) * 2.0 * PI));
    }
    ring(pts)
}

fn ring(mut pts: Vec<Pt2D>) -> geo::Polygon<f64> {
    pts.push(pts[0]);
    geo::Polygon::new(
        geo::LineString(pts.into_iter().map(|pt| pt.into()).collect()),
        Vec::new(),
    )
}

fn polygon_to_gps(poly: &geo::Polygon<f64>, b: &GPSBounds) -> geo::Polygon<f64> {
    geo::Polygon::new(
        ring_to_gps(poly.exterior(), b),
        poly.interiors()
            .iter()
            .map(|ring| ring_to_gps(ring, b))
            .collect(),
    )
}

fn ring_to_gps(ring: &geo::LineString<f64>, b: &GPSBounds) -> geo::LineString<f64> {
    geo::LineString(
        ring.0
            .iter()
            .map(|c| Pt2D::new(c.x, c.y).to_gps(b).into())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use geo::Intersects;

    use super::*;

    fn zigzag() -> Vec<LonLat> {
        vec![
            LonLat::new(13.0, 55.0),
            LonLat::new(13.01, 55.005),
            LonLat::new(13.02, 55.002),
            LonLat::new(13.035, 55.004),
        ]
    }

    #[test]
    fn buffer_contains_every_trail_point() {
        let path = zigzag();
        let buffer = buffer_trail(&[path.clone()], 250.0).unwrap();
        for pt in path {
            assert!(
                buffer.polygons.intersects(&geo::Point::from(pt)),
                "{} fell out of its own buffer",
                pt
            );
            assert!(buffer.bounds.contains(pt));
        }
    }

    #[test]
    fn bbox_grows_past_the_trail() {
        let path = zigzag();
        let trail_bounds = GPSBounds::from(&path);
        let buffer = buffer_trail(&[path], 250.0).unwrap();
        assert!(buffer.bounds.min_lon < trail_bounds.min_lon);
        assert!(buffer.bounds.min_lat < trail_bounds.min_lat);
        assert!(buffer.bounds.max_lon > trail_bounds.max_lon);
        assert!(buffer.bounds.max_lat > trail_bounds.max_lat);
    }

    #[test]
    fn lone_points_buffer_to_circles() {
        let buffer = buffer_trail(&[vec![LonLat::new(13.0, 55.0)]], 250.0).unwrap();
        assert_eq!(buffer.polygons.0.len(), 1);
        assert!(buffer
            .polygons
            .intersects(&geo::Point::from(LonLat::new(13.0, 55.0))));
    }

    #[test]
    fn disjoint_paths_stay_disjoint() {
        // Two short segments about 10km apart
        let buffer = buffer_trail(
            &[
                vec![LonLat::new(13.0, 55.0), LonLat::new(13.001, 55.0)],
                vec![LonLat::new(13.15, 55.0), LonLat::new(13.151, 55.0)],
            ],
            250.0,
        )
        .unwrap();
        assert_eq!(buffer.polygons.0.len(), 2);
    }

    #[test]
    fn bad_inputs_are_fatal() {
        assert!(buffer_trail(&[zigzag()], -1.0).is_err());
        assert!(buffer_trail(&[], 250.0).is_err());
        assert!(buffer_trail(&[Vec::new()], 250.0).is_err());
    }
}
