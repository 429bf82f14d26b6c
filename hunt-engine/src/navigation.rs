//! Distance and direction readouts toward the active challenge's target.
use serde::{Deserialize, Serialize};

use crate::data::{Challenge, ChallengeType};
use crate::geo::{
    CompassPoint, DistanceScale, FormattedDistance, LatLng, bearing_degrees, distance_meters,
    format_distance_as,
};

/// Where the target lies relative to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    pub meters: f64,
    pub distance: FormattedDistance,
    pub bearing_degrees: f64,
    pub direction: CompassPoint,
}

/// Readout from `from` to the challenge target, or `None` for challenges without one.
#[must_use]
pub fn navigate(
    challenge: &Challenge,
    from: LatLng,
    use_metric: bool,
    scale: DistanceScale,
) -> Option<Navigation> {
    let (target, _) = challenge.geofence()?;
    let meters = distance_meters(from, target);
    let degrees = bearing_degrees(from, target);
    Some(Navigation {
        meters,
        distance: format_distance_as(meters, use_metric, scale),
        bearing_degrees: degrees,
        direction: CompassPoint::from_degrees(degrees),
    })
}

/// Short "how far, which way" text for an area search, in the small unit.
#[must_use]
pub fn search_hint(challenge: &Challenge, from: LatLng, use_metric: bool) -> Option<String> {
    if challenge.challenge_type() != ChallengeType::AreaSearch {
        return None;
    }
    let nav = navigate(challenge, from, use_metric, DistanceScale::Small)?;
    Some(format!("{} to the {}", nav.distance, nav.direction))
}
