//! Conversion between WGS84 longitude/latitude and the British National Grid
//! (OSGB36, EPSG:27700) easting/northing.
//!
//! Distances, projections onto track geometry and edge splitting all happen
//! in the planar frame, where one unit is one metre.

use geo::{Coord, LineString, Point};

use crate::Error;

struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn eccentricity_squared(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }
}

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

/// Seven parameter datum shift: translations in metres, scale in ppm,
/// rotations in arcseconds
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    s: f64,
    rx: f64,
    ry: f64,
    rz: f64,
}

const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    s: 20.4894,
    rx: -0.1502,
    ry: -0.2470,
    rz: -0.8421,
};

const OSGB36_TO_WGS84: Helmert = Helmert {
    tx: 446.448,
    ty: -125.157,
    tz: 542.060,
    s: -20.4894,
    rx: 0.1502,
    ry: 0.2470,
    rz: 0.8421,
};

impl Helmert {
    fn apply(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let scale = 1.0 + self.s * 1e-6;
        let rx = (self.rx / 3600.0).to_radians();
        let ry = (self.ry / 3600.0).to_radians();
        let rz = (self.rz / 3600.0).to_radians();

        [
            self.tx + scale * x - rz * y + ry * z,
            self.ty + rz * x + scale * y - rx * z,
            self.tz - ry * x + rx * y + scale * z,
        ]
    }
}

// National Grid projection constants
const SCALE_FACTOR: f64 = 0.999_601_271_7;
const ORIGIN_LAT_DEG: f64 = 49.0;
const ORIGIN_LON_DEG: f64 = -2.0;
const FALSE_EASTING: f64 = 400_000.0;
const FALSE_NORTHING: f64 = -100_000.0;

/// Convergence threshold of the inverse meridional arc iteration, 0.01 mm
const ARC_TOLERANCE: f64 = 1e-5;

/// Project a WGS84 point (x = longitude, y = latitude) into the planar frame.
///
/// # Errors
///
/// Returns [`Error::Projection`] if the point is not a valid geographic
/// position or cannot be represented on the grid.
pub fn to_planar(point: Point<f64>) -> Result<Coord<f64>, Error> {
    let (lon, lat) = (point.x(), point.y());
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(Error::Projection(format!(
            "({lon}, {lat}) is not a valid longitude/latitude"
        )));
    }

    let cartesian = to_cartesian(lat.to_radians(), lon.to_radians(), &WGS84);
    let shifted = WGS84_TO_OSGB36.apply(cartesian);
    let (lat, lon) = to_geodetic(shifted, &AIRY_1830);
    let coord = grid_from_osgb36(lat, lon);

    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(coord)
    } else {
        Err(Error::Projection(format!(
            "({}, {}) projected to a degenerate grid position",
            point.x(),
            point.y()
        )))
    }
}

/// Convert a planar grid coordinate back into a WGS84 point.
///
/// # Errors
///
/// Returns [`Error::Projection`] if the coordinate is not finite.
pub fn to_geographic(coord: Coord<f64>) -> Result<Point<f64>, Error> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(Error::Projection(format!(
            "({}, {}) is not a valid grid position",
            coord.x, coord.y
        )));
    }

    let (lat, lon) = osgb36_from_grid(coord);
    let cartesian = to_cartesian(lat, lon, &AIRY_1830);
    let shifted = OSGB36_TO_WGS84.apply(cartesian);
    let (lat, lon) = to_geodetic(shifted, &WGS84);

    let point = Point::new(lon.to_degrees(), lat.to_degrees());
    if point.x().is_finite() && point.y().is_finite() {
        Ok(point)
    } else {
        Err(Error::Projection(format!(
            "({}, {}) has no geographic position",
            coord.x, coord.y
        )))
    }
}

/// Convert a planar line back into WGS84
///
/// # Errors
///
/// Returns [`Error::Projection`] if any vertex cannot be converted.
pub fn line_to_geographic(line: &LineString<f64>) -> Result<LineString<f64>, Error> {
    line.coords()
        .map(|&coord| to_geographic(coord).map(|point| point.0))
        .collect()
}

/// Geodetic (radians, zero height) to earth-centred cartesian
fn to_cartesian(lat: f64, lon: f64, ellipsoid: &Ellipsoid) -> [f64; 3] {
    let e2 = ellipsoid.eccentricity_squared();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [
        nu * cos_lat * lon.cos(),
        nu * cos_lat * lon.sin(),
        (1.0 - e2) * nu * sin_lat,
    ]
}

/// Earth-centred cartesian to geodetic (radians); height is discarded
fn to_geodetic([x, y, z]: [f64; 3], ellipsoid: &Ellipsoid) -> (f64, f64) {
    let e2 = ellipsoid.eccentricity_squared();
    let p = x.hypot(y);
    let mut lat = z.atan2(p * (1.0 - e2));

    for _ in 0..16 {
        let sin_lat = lat.sin();
        let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * nu * sin_lat).atan2(p);
        let converged = (next - lat).abs() < 1e-13;
        lat = next;
        if converged {
            break;
        }
    }

    (lat, y.atan2(x))
}

fn meridional_arc(lat: f64) -> f64 {
    let Ellipsoid { a, b } = AIRY_1830;
    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);
    let lat0 = ORIGIN_LAT_DEG.to_radians();
    let diff = lat - lat0;
    let sum = lat + lat0;

    b * SCALE_FACTOR
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * diff
            - (3.0 * n + 3.0 * n2 + 2.625 * n3) * diff.sin() * sum.cos()
            + (1.875 * n2 + 1.875 * n3) * (2.0 * diff).sin() * (2.0 * sum).cos()
            - (35.0 / 24.0) * n3 * (3.0 * diff).sin() * (3.0 * sum).cos())
}

/// Radii of curvature at a latitude: (nu, rho, eta squared)
fn curvature(lat: f64) -> (f64, f64, f64) {
    let e2 = AIRY_1830.eccentricity_squared();
    let a = AIRY_1830.a;
    let sin_lat = lat.sin();
    let denominator = 1.0 - e2 * sin_lat * sin_lat;
    let nu = a * SCALE_FACTOR / denominator.sqrt();
    let rho = a * SCALE_FACTOR * (1.0 - e2) / denominator.powf(1.5);
    (nu, rho, nu / rho - 1.0)
}

/// Transverse Mercator forward projection of OSGB36 latitude/longitude (radians)
fn grid_from_osgb36(lat: f64, lon: f64) -> Coord<f64> {
    let (nu, rho, eta2) = curvature(lat);
    let (sin_lat, cos_lat) = lat.sin_cos();
    let tan_lat = lat.tan();
    let tan2 = tan_lat * tan_lat;
    let tan4 = tan2 * tan2;
    let cos3 = cos_lat.powi(3);
    let cos5 = cos_lat.powi(5);

    let i = meridional_arc(lat) + FALSE_NORTHING;
    let ii = nu / 2.0 * sin_lat * cos_lat;
    let iii = nu / 24.0 * sin_lat * cos3 * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_lat * cos5 * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos_lat;
    let v = nu / 6.0 * cos3 * (nu / rho - tan2);
    let vi = nu / 120.0 * cos5 * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dl = lon - ORIGIN_LON_DEG.to_radians();
    let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
    let easting = FALSE_EASTING + iv * dl + v * dl.powi(3) + vi * dl.powi(5);

    Coord {
        x: easting,
        y: northing,
    }
}

/// Inverse Transverse Mercator to OSGB36 latitude/longitude (radians)
fn osgb36_from_grid(coord: Coord<f64>) -> (f64, f64) {
    let a = AIRY_1830.a;
    let lat0 = ORIGIN_LAT_DEG.to_radians();
    let northing = coord.y - FALSE_NORTHING;

    let mut lat = northing / (a * SCALE_FACTOR) + lat0;
    let mut arc = meridional_arc(lat);
    for _ in 0..64 {
        if (northing - arc).abs() < ARC_TOLERANCE {
            break;
        }
        lat += (northing - arc) / (a * SCALE_FACTOR);
        arc = meridional_arc(lat);
    }

    let (nu, rho, eta2) = curvature(lat);
    let tan_lat = lat.tan();
    let tan2 = tan_lat * tan_lat;
    let tan4 = tan2 * tan2;
    let tan6 = tan4 * tan2;
    let sec_lat = 1.0 / lat.cos();

    let vii = tan_lat / (2.0 * rho * nu);
    let viii = tan_lat / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = tan_lat / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec_lat / nu;
    let xi = sec_lat / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
    let xii = sec_lat / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia =
        sec_lat / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

    let de = coord.x - FALSE_EASTING;
    let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = ORIGIN_LON_DEG.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
        - xiia * de.powi(7);

    (lat, lon)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use geo::{Distance, Haversine};
    use proptest::prelude::*;

    proptest! {
        /// to_geographic(to_planar(p)) stays within a few centimetres of p
        #[test]
        fn planar_roundtrip(lon in -7.5f64..1.8, lat in 49.9f64..58.7) {
            let point = Point::new(lon, lat);
            let planar = to_planar(point).unwrap();
            let back = to_geographic(planar).unwrap();
            let error = Haversine.distance(point, back);
            prop_assert!(error < 0.05, "round trip drifted {error} m");
        }

        /// Planar distance tracks geodesic distance for short hops
        #[test]
        fn planar_distances_are_metric(lon in -5.0f64..1.0, lat in 50.5f64..55.0, d in 0.0001f64..0.01) {
            let a = Point::new(lon, lat);
            let b = Point::new(lon + d, lat + d);
            let planar = to_planar(a).unwrap() - to_planar(b).unwrap();
            let planar_distance = planar.x.hypot(planar.y);
            let geodesic = Haversine.distance(a, b);
            prop_assert!((planar_distance - geodesic).abs() / geodesic < 0.01);
        }
    }
}
