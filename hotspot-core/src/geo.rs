//! Great-circle geometry shared by collector implementations.

use geo::Coord;

/// Earth radius in meters used for all distance computations.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Haversine distance in meters between two WGS84 coordinates.
///
/// Coordinates use `x = longitude`, `y = latitude`, in degrees, on a
/// sphere of radius [`EARTH_RADIUS`].
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use hotspot_core::haversine_distance;
///
/// let utrecht = Coord { x: 5.121420, y: 52.090737 };
/// assert_eq!(haversine_distance(utrecht, utrecht), 0.0);
/// ```
pub fn haversine_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let half_dlat = (lat2 - lat1) / 2.0;
    let half_dlon = (b.x - a.x).to_radians() / 2.0;
    let chord = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
    EARTH_RADIUS * 2.0 * chord.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Coord { x: 0.0, y: 0.0 })]
    #[case(Coord { x: 5.121420, y: 52.090737 })]
    #[case(Coord { x: -180.0, y: -90.0 })]
    fn self_distance_is_zero(#[case] point: Coord<f64>) {
        assert!(haversine_distance(point, point).abs() < 1e-9);
    }

    #[rstest]
    fn one_degree_of_latitude_on_the_meridian() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 0.0, y: 1.0 };
        let expected = EARTH_RADIUS * 1.0_f64.to_radians();
        assert!((haversine_distance(a, b) - expected).abs() < 1e-6);
    }

    #[rstest]
    fn distance_is_symmetric() {
        let a = Coord { x: 5.1214, y: 52.0907 };
        let b = Coord { x: 4.8952, y: 52.3702 };
        let there = haversine_distance(a, b);
        let back = haversine_distance(b, a);
        assert!((there - back).abs() < 1e-9);
        assert!(there > 0.0);
    }
}
