//! Typed view of a validated `GetPOIs` request.

use geo::Coord;
use hotspot_core::PoiQuery;
use serde::Serialize;

/// Everything a validated request told us, coerced to native types.
///
/// Collectors receive the spatial subset as a [`PoiQuery`]; the rest is
/// available to richer collector implementations and to request logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    /// Client-supplied user identifier.
    pub user_id: String,
    /// Name of the layer being queried.
    pub layer_name: String,
    /// Client software version string.
    pub version: String,
    /// Request timestamp, zero when the client sent none.
    pub timestamp: i64,
    /// Origin latitude in decimal degrees.
    pub lat: f64,
    /// Origin longitude in decimal degrees.
    pub lon: f64,
    /// Requested search radius in metres, zero meaning unbounded.
    pub radius: i64,
    /// Reported positional accuracy in metres.
    pub accuracy: i64,
    /// Origin altitude in metres.
    pub alt: i64,
    /// Continuation key for paged result sets.
    pub page_key: String,
    /// Preferred response language.
    pub lang: String,
    /// ISO country code of the client.
    pub country_code: String,
    /// Selected value of the layer's radio list widget.
    pub radiolist: String,
    /// First search box value, if any.
    pub searchbox1: Option<String>,
    /// Second search box value, if any.
    pub searchbox2: Option<String>,
    /// Third search box value, if any.
    pub searchbox3: Option<String>,
    /// First custom slider value, if any.
    pub slider1: Option<f64>,
    /// Second custom slider value, if any.
    pub slider2: Option<f64>,
    /// Third custom slider value, if any.
    pub slider3: Option<f64>,
    /// Ticked checkbox values.
    pub checkboxes: Vec<String>,
    /// Point of interest the client wants brought into focus.
    pub requested_poi_id: Option<String>,
    /// User agent reported by the transport layer.
    pub user_agent: Option<String>,
    /// Transport session identifier, if one exists.
    pub session_id: Option<String>,
}

impl Filter {
    /// The spatial query this filter asks the collector to run.
    #[must_use]
    pub fn query(&self) -> PoiQuery {
        PoiQuery::new(
            Coord {
                x: self.lon,
                y: self.lat,
            },
            self.radius,
            self.accuracy,
        )
    }

    /// The requested radius, or `None` when the request was unbounded.
    #[must_use]
    pub fn radius_hint(&self) -> Option<i64> {
        (self.radius > 0).then_some(self.radius)
    }
}
