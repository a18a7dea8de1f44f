use std::fmt;

use ordered_float::NotNan;

/// A geographic coordinate. Longitude is x, latitude is y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// Haversine distance in meters.
    pub fn gps_dist_meters(self, other: LonLat) -> f64 {
        let earth_radius_m = 6_371_000.0;
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        earth_radius_m * c
    }

    pub fn to_pt(self, b: &GPSBounds) -> Pt2D {
        b.convert(self)
    }

    pub fn to_hashable(self) -> HashablePt2D {
        HashablePt2D::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

impl From<LonLat> for geo::Coordinate<f64> {
    fn from(pt: LonLat) -> Self {
        geo::Coordinate {
            x: pt.longitude,
            y: pt.latitude,
        }
    }
}

impl From<LonLat> for geo::Point<f64> {
    fn from(pt: LonLat) -> Self {
        geo::Point::new(pt.longitude, pt.latitude)
    }
}

/// A position in a flat plane, measured in meters. The y axis points south, so the northernmost
/// point of the region maps to y=0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Walk `dist` meters from this point in the direction `angle`, in radians.
    pub fn project_away(self, dist: f64, angle: f64) -> Pt2D {
        let (sin, cos) = angle.sin_cos();
        Pt2D::new(self.x + dist * cos, self.y + dist * sin)
    }

    pub fn to_gps(self, b: &GPSBounds) -> LonLat {
        b.convert_back(self)
    }
}

impl From<Pt2D> for geo::Coordinate<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Coordinate { x: pt.x, y: pt.y }
    }
}

/// A point that can be hashed, for matching up endpoints exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HashablePt2D {
    x_nan: NotNan<f64>,
    y_nan: NotNan<f64>,
}

impl HashablePt2D {
    pub fn new(x: f64, y: f64) -> HashablePt2D {
        HashablePt2D {
            x_nan: NotNan::new(x).unwrap(),
            y_nan: NotNan::new(y).unwrap(),
        }
    }
}

/// An axis-aligned bounding box in geographic coordinates. Also acts as the anchor for converting
/// between geographic and world-space coordinates, using an equirectangular projection scaled to
/// be accurate near the bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GPSBounds {
    pub fn new() -> GPSBounds {
        GPSBounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    pub fn from(pts: &[LonLat]) -> GPSBounds {
        let mut b = GPSBounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn update(&mut self, pt: LonLat) {
        self.min_lon = self.min_lon.min(pt.longitude);
        self.max_lon = self.max_lon.max(pt.longitude);
        self.min_lat = self.min_lat.min(pt.latitude);
        self.max_lat = self.max_lat.max(pt.latitude);
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.longitude >= self.min_lon
            && pt.longitude <= self.max_lon
            && pt.latitude >= self.min_lat
            && pt.latitude <= self.max_lat
    }

    // Meters per degree of longitude and latitude, measured at the center of the bounds. One
    // degree of longitude shrinks towards the poles, so this only holds up near the bounds.
    fn scale(&self) -> (f64, f64) {
        let center_lat = (self.min_lat + self.max_lat) / 2.0;
        let meters_per_lon = LonLat::new(self.min_lon, center_lat)
            .gps_dist_meters(LonLat::new(self.min_lon + 1.0, center_lat));
        let meters_per_lat = LonLat::new(self.min_lon, center_lat - 0.5)
            .gps_dist_meters(LonLat::new(self.min_lon, center_lat + 0.5));
        (meters_per_lon, meters_per_lat)
    }

    /// Invert y, so the northernmost latitude is 0. Points outside the bounds just map to
    /// negative or larger coordinates.
    pub fn convert(&self, pt: LonLat) -> Pt2D {
        let (scale_x, scale_y) = self.scale();
        Pt2D::new(
            (pt.longitude - self.min_lon) * scale_x,
            (self.max_lat - pt.latitude) * scale_y,
        )
    }

    pub fn convert_back(&self, pt: Pt2D) -> LonLat {
        let (scale_x, scale_y) = self.scale();
        LonLat::new(
            self.min_lon + pt.x() / scale_x,
            self.max_lat - pt.y() / scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_roundtrips() {
        let mut bounds = GPSBounds::new();
        bounds.update(LonLat::new(13.0, 55.0));
        bounds.update(LonLat::new(14.0, 56.0));

        // Both inside and outside the bounds
        for pt in [
            LonLat::new(13.5, 55.5),
            LonLat::new(13.0, 56.0),
            LonLat::new(12.9, 54.8),
            LonLat::new(14.3, 56.1),
        ] {
            let back = pt.to_pt(&bounds).to_gps(&bounds);
            assert!((back.longitude - pt.longitude).abs() < 1e-9, "{}", pt);
            assert!((back.latitude - pt.latitude).abs() < 1e-9, "{}", pt);
        }
    }

    #[test]
    fn one_km_east_is_about_one_km() {
        // 0.0157 degrees of longitude at 55N is just over 1km
        let pt1 = LonLat::new(13.0, 55.0);
        let pt2 = LonLat::new(13.0157, 55.0);
        let bounds = GPSBounds::from(&[pt1, pt2]);

        let dist = pt2.to_pt(&bounds).x() - pt1.to_pt(&bounds).x();
        assert!((dist - 1000.0).abs() < 5.0, "got {}m", dist);
        assert!((pt1.gps_dist_meters(pt2) - 1000.0).abs() < 5.0);
    }
}
