use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional coordinates
///
/// `None` means proximity cannot be evaluated. It is never zero distance.
#[inline]
pub fn distance_between(from: Option<Coordinate>, to: Option<Coordinate>) -> Option<f64> {
    let (from, to) = (from?, to?);
    if !from.is_valid() || !to.is_valid() {
        return None;
    }
    Some(haversine_distance(
        from.latitude,
        from.longitude,
        to.latitude,
        to.longitude,
    ))
}

/// Calculate a bounding box around a center point
///
/// Used to narrow the storage query before exact distances are computed, so
/// it must contain every point within `radius_km`. The longitude extent is the
/// exact spherical one, asin(sin(d) / cos(lat)), which is wider than the flat
/// km-per-degree estimate at high latitudes. When a pole is in reach the box
/// spans every longitude.
pub fn calculate_bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular.to_degrees();
    let min_lat = center.latitude - lat_delta;
    let max_lat = center.latitude + lat_delta;

    let lat_rad = center.latitude.to_radians();
    let reaches_pole = min_lat <= -90.0
        || max_lat >= 90.0
        || angular >= std::f64::consts::FRAC_PI_2
        || angular.sin() >= lat_rad.cos();

    if reaches_pole {
        return BoundingBox {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lon: -180.0,
            max_lon: 180.0,
        };
    }

    let lon_delta = (angular.sin() / lat_rad.cos()).asin().to_degrees();

    BoundingBox {
        min_lat,
        max_lat,
        min_lon: center.longitude - lon_delta,
        max_lon: center.longitude + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: Coordinate, bbox: &BoundingBox) -> bool {
    let lon_ok = bbox.crosses_antimeridian()
        || (point.longitude >= bbox.min_lon && point.longitude <= bbox.max_lon);
    point.latitude >= bbox.min_lat && point.latitude <= bbox.max_lat && lon_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_distance_between_missing_coordinate() {
        let dublin = Some(Coordinate::new(53.3498, -6.2603));
        assert!(distance_between(dublin, None).is_none());
        assert!(distance_between(None, dublin).is_none());
        assert!(distance_between(None, None).is_none());
    }

    #[test]
    fn test_distance_between_invalid_coordinate() {
        let dublin = Some(Coordinate::new(53.3498, -6.2603));
        let broken = Some(Coordinate::new(f64::NAN, 0.0));
        assert!(distance_between(dublin, broken).is_none());
    }

    #[test]
    fn test_distance_between_same_point() {
        let dublin = Some(Coordinate::new(53.3498, -6.2603));
        let distance = distance_between(dublin, dublin).unwrap();
        assert!(distance < 1e-9);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(Coordinate::new(53.3498, -6.2603), 10.0);

        assert!(bbox.min_lat < 53.3498);
        assert!(bbox.max_lat > 53.3498);
        assert!(bbox.min_lon < -6.2603);
        assert!(bbox.max_lon > -6.2603);

        // 20 km of latitude is ~0.18 degrees
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(Coordinate::new(53.3498, -6.2603), 10.0);

        assert!(is_within_bounding_box(Coordinate::new(53.3498, -6.2603), &bbox));
        assert!(is_within_bounding_box(Coordinate::new(53.35, -6.26), &bbox));
        assert!(!is_within_bounding_box(Coordinate::new(51.9, -8.47), &bbox));
    }

    #[test]
    fn test_bbox_across_antimeridian() {
        let bbox = calculate_bounding_box(Coordinate::new(-17.7, 179.95), 50.0);
        assert!(bbox.crosses_antimeridian());
        assert!(is_within_bounding_box(Coordinate::new(-17.7, -179.9), &bbox));
    }

    /// Point `distance_km` from `from` along `bearing_deg`
    fn destination(from: Coordinate, distance_km: f64, bearing_deg: f64) -> Coordinate {
        let angular = distance_km / EARTH_RADIUS_KM;
        let lat1 = from.latitude.to_radians();
        let bearing = bearing_deg.to_radians();

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = from.longitude.to_radians()
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
    }

    #[test]
    fn test_bbox_contains_circle_at_high_latitude() {
        let center = Coordinate::new(70.0, 20.0);
        let bbox = calculate_bounding_box(center, 800.0);

        for step in 0..360 {
            let point = destination(center, 799.0, step as f64);
            assert!(
                is_within_bounding_box(point, &bbox),
                "bearing {} point {:?} outside {:?}",
                step,
                point,
                bbox
            );
        }
    }

    #[test]
    fn test_bbox_spans_all_longitudes_near_pole() {
        let bbox = calculate_bounding_box(Coordinate::new(85.0, 10.0), 1000.0);

        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
        assert!(!bbox.crosses_antimeridian());
        assert!(is_within_bounding_box(Coordinate::new(84.0, -170.0), &bbox));
    }
}
