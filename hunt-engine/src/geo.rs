//! Great-circle distance, compass bearing and geofence helpers.
use num_traits::cast::cast;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numbers::{round_to_places, usize_to_f64};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const FEET_PER_METER: f64 = 3.28084;
pub const MILES_PER_KILOMETER: f64 = 0.621_371;

const METERS_PER_KILOMETER: f64 = 1_000.0;
const FEET_PER_MILE: f64 = 5_280.0;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the valid degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance between two points in meters.
#[must_use]
pub fn distance_meters(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let sin_d_phi = (d_phi / 2.0).sin();
    let sin_d_lambda = (d_lambda / 2.0).sin();
    let h = sin_d_phi * sin_d_phi + phi1.cos() * phi2.cos() * sin_d_lambda * sin_d_lambda;
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Whether `current` lies inside the circle of `radius_m` around `target`. Boundary inclusive.
#[must_use]
pub fn is_within_geofence(current: LatLng, target: LatLng, radius_m: f64) -> bool {
    distance_meters(current, target) <= radius_m
}

/// Initial great-circle bearing from `from` towards `to`, normalized to `[0, 360)`.
#[must_use]
pub fn bearing_degrees(from: LatLng, to: LatLng) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let degrees = y.atan2(x).to_degrees();
    (degrees + 360.0) % 360.0
}

/// Compass label for the direction to travel from `from` to reach `to`.
#[must_use]
pub fn bearing(from: LatLng, to: LatLng) -> CompassPoint {
    CompassPoint::from_degrees(bearing_degrees(from, to))
}

/// Destination reached by travelling `distance_m` from `origin` along `bearing_deg`.
#[must_use]
pub fn offset(origin: LatLng, bearing_deg: f64, distance_m: f64) -> LatLng {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());
    let longitude = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;

    LatLng::new(phi2.to_degrees(), longitude)
}

/// Sixteen-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassPoint {
    pub const ALL: [Self; 16] = [
        Self::N,
        Self::NNE,
        Self::NE,
        Self::ENE,
        Self::E,
        Self::ESE,
        Self::SE,
        Self::SSE,
        Self::S,
        Self::SSW,
        Self::SW,
        Self::WSW,
        Self::W,
        Self::WNW,
        Self::NW,
        Self::NNW,
    ];

    /// Map a bearing in degrees onto the nearest rose point. Sector edges round clockwise.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::N;
        }
        let sector = 360.0 / usize_to_f64(Self::ALL.len());
        let normalized = degrees.rem_euclid(360.0);
        let index = cast::<f64, usize>((normalized / sector + 0.5).floor()).unwrap_or(0);
        Self::ALL[index % Self::ALL.len()]
    }

    /// The point facing the other way.
    #[must_use]
    pub fn opposite(self) -> Self {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() / 2) % Self::ALL.len()]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NNE => "NNE",
            Self::NE => "NE",
            Self::ENE => "ENE",
            Self::E => "E",
            Self::ESE => "ESE",
            Self::SE => "SE",
            Self::SSE => "SSE",
            Self::S => "S",
            Self::SSW => "SSW",
            Self::SW => "SW",
            Self::WSW => "WSW",
            Self::W => "W",
            Self::WNW => "WNW",
            Self::NW => "NW",
            Self::NNW => "NNW",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit a distance is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl DistanceUnit {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Feet => "ft",
            Self::Miles => "mi",
        }
    }
}

/// Which end of the unit pair a readout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceScale {
    /// Meters or feet, used for hint and clue ranges.
    Small,
    /// Kilometers or miles, used for overall progress.
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormattedDistance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl fmt::Display for FormattedDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            DistanceUnit::Meters | DistanceUnit::Feet => {
                write!(f, "{:.0} {}", self.value, self.unit.symbol())
            }
            DistanceUnit::Kilometers | DistanceUnit::Miles => {
                write!(f, "{:.2} {}", self.value, self.unit.symbol())
            }
        }
    }
}

/// Format a distance, picking the small unit below one kilometer (metric) or one mile
/// (imperial) and the large unit otherwise.
#[must_use]
pub fn format_distance(meters: f64, use_metric: bool) -> FormattedDistance {
    let small = if use_metric {
        meters < METERS_PER_KILOMETER
    } else {
        meters * FEET_PER_METER < FEET_PER_MILE
    };
    let scale = if small {
        DistanceScale::Small
    } else {
        DistanceScale::Large
    };
    format_distance_as(meters, use_metric, scale)
}

/// Format a distance in an explicitly chosen scale.
#[must_use]
pub fn format_distance_as(meters: f64, use_metric: bool, scale: DistanceScale) -> FormattedDistance {
    let meters = if meters.is_finite() { meters.max(0.0) } else { 0.0 };
    match (use_metric, scale) {
        (true, DistanceScale::Small) => FormattedDistance {
            value: round_to_places(meters, 0),
            unit: DistanceUnit::Meters,
        },
        (true, DistanceScale::Large) => FormattedDistance {
            value: round_to_places(meters / METERS_PER_KILOMETER, 2),
            unit: DistanceUnit::Kilometers,
        },
        (false, DistanceScale::Small) => FormattedDistance {
            value: round_to_places(meters * FEET_PER_METER, 0),
            unit: DistanceUnit::Feet,
        },
        (false, DistanceScale::Large) => FormattedDistance {
            value: round_to_places(meters / METERS_PER_KILOMETER * MILES_PER_KILOMETER, 2),
            unit: DistanceUnit::Miles,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES_SQUARE: LatLng = LatLng::new(40.758, -73.9855);
    const CENTRAL_PARK: LatLng = LatLng::new(40.7829, -73.9654);

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let forward = distance_meters(TIMES_SQUARE, CENTRAL_PARK);
        let backward = distance_meters(CENTRAL_PARK, TIMES_SQUARE);
        assert!((forward - backward).abs() < 1e-9);
        assert!(distance_meters(TIMES_SQUARE, TIMES_SQUARE).abs() < f64::EPSILON);
        assert!((3_000.0..3_400.0).contains(&forward), "got {forward}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let d = distance_meters(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn geofence_boundary_is_inclusive() {
        let target = LatLng::new(40.0, -74.0);
        let edge = offset(target, 90.0, 50.0);
        let radius = distance_meters(edge, target);
        assert!(is_within_geofence(edge, target, radius));
        assert!(!is_within_geofence(edge, target, radius - 0.001));
        assert!(is_within_geofence(target, target, 0.0));
    }

    #[test]
    fn offset_lands_at_requested_distance() {
        let origin = LatLng::new(40.0, -74.0);
        for bearing_deg in [0.0, 45.0, 180.0, 270.0] {
            let moved = offset(origin, bearing_deg, 200.0);
            assert!((distance_meters(origin, moved) - 200.0).abs() < 0.01);
        }
    }

    #[test]
    fn bearing_labels_cardinal_directions() {
        let origin = LatLng::new(10.0, 10.0);
        assert_eq!(bearing(origin, LatLng::new(11.0, 10.0)), CompassPoint::N);
        assert_eq!(bearing(origin, LatLng::new(9.0, 10.0)), CompassPoint::S);
        assert_eq!(bearing(origin, LatLng::new(10.0, 11.0)), CompassPoint::E);
        assert_eq!(bearing(origin, LatLng::new(10.0, 9.0)), CompassPoint::W);
        assert_eq!(bearing(origin, offset(origin, 135.0, 500.0)), CompassPoint::SE);
    }

    #[test]
    fn bearing_is_deterministic_and_reverses() {
        let first = bearing(TIMES_SQUARE, CENTRAL_PARK);
        assert_eq!(first, bearing(TIMES_SQUARE, CENTRAL_PARK));
        assert_eq!(bearing(CENTRAL_PARK, TIMES_SQUARE), first.opposite());
    }

    #[test]
    fn compass_wraps_near_north() {
        assert_eq!(CompassPoint::from_degrees(359.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(11.25), CompassPoint::NNE);
        assert_eq!(CompassPoint::from_degrees(-90.0), CompassPoint::W);
        assert_eq!(CompassPoint::from_degrees(f64::NAN), CompassPoint::N);
    }

    #[test]
    fn format_distance_uses_source_factors() {
        let feet = format_distance_as(100.0, false, DistanceScale::Small);
        assert_eq!(feet.unit, DistanceUnit::Feet);
        assert!((feet.value - 328.0).abs() < f64::EPSILON);

        let miles = format_distance_as(10_000.0, false, DistanceScale::Large);
        assert_eq!(miles.unit, DistanceUnit::Miles);
        assert!((miles.value - 6.21).abs() < 1e-9);

        let km = format_distance_as(2_346.0, true, DistanceScale::Large);
        assert_eq!(km.to_string(), "2.35 km");
    }

    #[test]
    fn format_distance_switches_units_by_magnitude() {
        assert_eq!(format_distance(999.0, true).unit, DistanceUnit::Meters);
        assert_eq!(format_distance(1_000.0, true).unit, DistanceUnit::Kilometers);
        assert_eq!(format_distance(1_000.0, false).unit, DistanceUnit::Feet);
        assert_eq!(format_distance(1_700.0, false).unit, DistanceUnit::Miles);
        assert!(format_distance(-5.0, true).value.abs() < f64::EPSILON);
    }
}
