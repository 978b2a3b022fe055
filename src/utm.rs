//! WGS84 -> UTM projection, used to size an output image in metres.
//!
//! Forward transverse Mercator after Krüger, truncated at the third order
//! term. That is accurate to well below a metre inside a zone, far more
//! than pixel sizing needs.
use crate::area::GeoBoundingBox;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Longitude offset from the central meridian past which the series
/// no longer maps points monotonically.
pub const MAX_MERIDIAN_OFFSET: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub north: bool,
}

impl UtmZone {
    pub fn for_point(lon: f64, lat: f64) -> Self {
        let number = zone_exception(lon, lat)
            .unwrap_or_else(|| (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8);
        Self {
            number,
            north: lat >= 0.0,
        }
    }

    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    pub fn meridian_offset(&self, lon: f64) -> f64 {
        (lon - self.central_meridian()).abs()
    }

    pub fn epsg(&self) -> u32 {
        let base = if self.north { 32600 } else { 32700 };
        base + u32::from(self.number)
    }

    /// Projects a lon/lat pair in degrees to (easting, northing) in metres.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let n = WGS84_F / (2.0 - WGS84_F);
        let a_rect = WGS84_A / (1.0 + n) * (1.0 + n.powi(2) / 4.0 + n.powi(4) / 64.0);
        let alpha = [
            n / 2.0 - 2.0 * n.powi(2) / 3.0 + 5.0 * n.powi(3) / 16.0,
            13.0 * n.powi(2) / 48.0 - 3.0 * n.powi(3) / 5.0,
            61.0 * n.powi(3) / 240.0,
        ];
        let e = 2.0 * n.sqrt() / (1.0 + n);

        let phi = lat.to_radians();
        let dlambda = (lon - self.central_meridian()).to_radians();

        let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
        let xi = t.atan2(dlambda.cos());
        let eta = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let (mut x, mut y) = (eta, xi);
        for (j, a) in alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            x += a * (k * xi).cos() * (k * eta).sinh();
            y += a * (k * xi).sin() * (k * eta).cosh();
        }

        let easting = FALSE_EASTING + K0 * a_rect * x;
        let northing = K0 * a_rect * y + if self.north { 0.0 } else { FALSE_NORTHING_SOUTH };
        (easting, northing)
    }
}

// Widened zones of south-west Norway and Svalbard
fn zone_exception(lon: f64, lat: f64) -> Option<u8> {
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        return Some(32);
    }
    if (72.0..=84.0).contains(&lat) && lon >= 0.0 {
        return match lon {
            l if l < 9.0 => Some(31),
            l if l < 21.0 => Some(33),
            l if l < 33.0 => Some(35),
            l if l < 42.0 => Some(37),
            _ => None,
        };
    }
    None
}

/// Pixel (width, height) of `bbox` at `resolution` metres per pixel.
///
/// Both corners are projected into the UTM zone of the box middle. Returns
/// `None` when a corner lies too far from that zone for the projection to
/// hold.
pub fn bbox_to_dimensions(bbox: &GeoBoundingBox, resolution: f64) -> Option<(u32, u32)> {
    let (lon, lat) = bbox.middle();
    let zone = UtmZone::for_point(lon, lat);

    if zone.meridian_offset(bbox.west) >= MAX_MERIDIAN_OFFSET
        || zone.meridian_offset(bbox.east) >= MAX_MERIDIAN_OFFSET
    {
        return None;
    }

    let (east1, north1) = zone.project(bbox.west, bbox.south);
    let (east2, north2) = zone.project(bbox.east, bbox.north);
    if ![east1, north1, east2, north2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let width = ((east2 - east1).abs() / resolution).round() as u32;
    let height = ((north2 - north1).abs() / resolution).round() as u32;
    Some((width, height))
}

/// Width in pixels along the box's widest parallel on a sphere. Coarse, for
/// boxes outside the UTM domain only.
pub fn approximate_width(bbox: &GeoBoundingBox, resolution: f64) -> u32 {
    let widest = if bbox.south <= 0.0 && bbox.north >= 0.0 {
        0.0
    } else {
        bbox.south.abs().min(bbox.north.abs())
    };
    let metres = (bbox.east - bbox.west).to_radians() * WGS84_A * widest.to_radians().cos();
    (metres / resolution).round() as u32
}
