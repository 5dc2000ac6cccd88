/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

pub fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_longitude(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_seattle_portland() {
        // Seattle
        let seattle = (47.6062, -122.3321);
        // Portland
        let portland = (45.5152, -122.6784);

        let distance = haversine_distance(seattle.0, seattle.1, portland.0, portland.1);
        // Should be approximately 230-240 km
        assert!(distance > 220.0 && distance < 250.0);
    }

    #[test]
    fn test_zero_distance() {
        let d = haversine_distance(47.6, -122.3, 47.6, -122.3);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(is_valid_latitude(90.0));
        assert!(is_valid_latitude(-90.0));
        assert!(!is_valid_latitude(90.01));

        assert!(is_valid_longitude(180.0));
        assert!(is_valid_longitude(-180.0));
        assert!(!is_valid_longitude(-180.5));
    }
}
