//! Request validation and conversion into a [`Filter`].

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::RequestError;
use crate::filter::Filter;
use crate::layer::Layer;

/// Raw key/value request fields, as decoded from the query string.
pub type RequestFields = HashMap<String, String>;

/// Fields every request must carry with a non-empty value.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "userId",
    "developerId",
    "developerHash",
    "timestamp",
    "layerName",
    "lat",
    "lon",
];

/// Fields a request may carry; absent ones are defaulted to empty strings
/// before filter construction so downstream code never probes for presence.
pub const OPTIONAL_FIELDS: [&str; 24] = [
    "accuracy",
    "radius",
    "alt",
    "pageKey",
    "lang",
    "countryCode",
    "version",
    "requestedPoiId",
    "RADIOLIST",
    "SEARCHBOX",
    "SEARCHBOX_1",
    "SEARCHBOX_2",
    "SEARCHBOX_3",
    "CUSTOM_SLIDER",
    "CUSTOM_SLIDER_1",
    "CUSTOM_SLIDER_2",
    "CUSTOM_SLIDER_3",
    "CHECKBOXLIST",
    "oauth_consumer_key",
    "oauth_signature_method",
    "oauth_timestamp",
    "oauth_nonce",
    "oauth_version",
    "oauth_signature",
];

/// Transport-level request context that is not part of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// User agent of the client, when the transport reported one.
    pub user_agent: Option<String>,
    /// Session identifier assigned by the transport, if any.
    pub session_id: Option<String>,
}

/// Checks a request against the configured layers.
///
/// Required fields must be present and non-empty, the named layer must
/// exist, the developer credentials must match it, and the origin
/// coordinates must be numbers within range. Optional fields missing from
/// the request are filled in with empty strings.
///
/// # Errors
///
/// Returns the first [`RequestError`] encountered, in the order the checks
/// are listed above.
pub fn validate_request(
    fields: &mut RequestFields,
    layers: &HashMap<String, Layer>,
) -> Result<(), RequestError> {
    for name in REQUIRED_FIELDS {
        if fields.get(name).is_none_or(|value| value.is_empty()) {
            return Err(RequestError::MissingParameter(name));
        }
    }
    for name in OPTIONAL_FIELDS {
        fields.entry(name.to_owned()).or_default();
    }

    let layer_name = field(fields, "layerName");
    let Some(layer) = layers.get(layer_name) else {
        return Err(RequestError::UnknownLayer(layer_name.to_owned()));
    };
    let developer_id = field(fields, "developerId");
    if developer_id != layer.developer_id() {
        return Err(RequestError::UnknownDeveloper(developer_id.to_owned()));
    }
    if !layer
        .verifier()
        .verify(field(fields, "developerHash"), field(fields, "timestamp"))
    {
        return Err(RequestError::InvalidCredential);
    }

    let lat_raw = field(fields, "lat");
    let lat: f64 = lat_raw
        .parse()
        .map_err(|_| RequestError::InvalidLatitude(lat_raw.to_owned()))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(RequestError::InvalidLatitude(lat_raw.to_owned()));
    }
    let lon_raw = field(fields, "lon");
    let lon: f64 = lon_raw
        .parse()
        .map_err(|_| RequestError::InvalidLongitude(lon_raw.to_owned()))?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(RequestError::InvalidLongitude(lon_raw.to_owned()));
    }
    Ok(())
}

/// Builds a [`Filter`] from validated request fields.
///
/// Must only be called after [`validate_request`] has succeeded; optional
/// fields are then guaranteed present. Numeric fields that fail to parse
/// are logged and fall back to zero rather than failing the request.
#[must_use]
pub fn build_filter(fields: &RequestFields, session: &SessionInfo) -> Filter {
    for key in fields.keys() {
        if !is_recognized(key) {
            debug!("ignoring unrecognized request field {key}");
        }
    }

    let requested_poi_id = non_empty(fields, "requestedPoiId").filter(|id| id != "None");
    let checkboxes = match field(fields, "CHECKBOXLIST") {
        "" => Vec::new(),
        raw => raw.split(',').map(str::to_owned).collect(),
    };

    Filter {
        user_id: field(fields, "userId").to_owned(),
        layer_name: field(fields, "layerName").to_owned(),
        version: field(fields, "version").to_owned(),
        timestamp: integer_field(fields, "timestamp"),
        lat: float_field(fields, "lat"),
        lon: float_field(fields, "lon"),
        radius: integer_field(fields, "radius"),
        accuracy: integer_field(fields, "accuracy"),
        alt: integer_field(fields, "alt"),
        page_key: field(fields, "pageKey").to_owned(),
        lang: field(fields, "lang").to_owned(),
        country_code: field(fields, "countryCode").to_owned(),
        radiolist: field(fields, "RADIOLIST").to_owned(),
        searchbox1: widget_value(fields, "SEARCHBOX", "SEARCHBOX_1"),
        searchbox2: non_empty(fields, "SEARCHBOX_2"),
        searchbox3: non_empty(fields, "SEARCHBOX_3"),
        slider1: slider_value(fields, "CUSTOM_SLIDER", "CUSTOM_SLIDER_1"),
        slider2: optional_float(fields, "CUSTOM_SLIDER_2"),
        slider3: optional_float(fields, "CUSTOM_SLIDER_3"),
        checkboxes,
        requested_poi_id,
        user_agent: session.user_agent.clone(),
        session_id: session.session_id.clone(),
    }
}

fn is_recognized(key: &str) -> bool {
    REQUIRED_FIELDS.contains(&key) || OPTIONAL_FIELDS.contains(&key)
}

fn field<'a>(fields: &'a RequestFields, name: &str) -> &'a str {
    fields.get(name).map_or("", String::as_str)
}

fn non_empty(fields: &RequestFields, name: &str) -> Option<String> {
    fields.get(name).filter(|value| !value.is_empty()).cloned()
}

/// The generic widget field overrides its `_1` suffixed twin when set.
fn widget_value(fields: &RequestFields, generic: &str, first: &str) -> Option<String> {
    non_empty(fields, generic).or_else(|| non_empty(fields, first))
}

fn slider_value(fields: &RequestFields, generic: &str, first: &str) -> Option<f64> {
    if fields.get(generic).is_some_and(|value| !value.is_empty()) {
        optional_float(fields, generic)
    } else {
        optional_float(fields, first)
    }
}

fn integer_field(fields: &RequestFields, name: &str) -> i64 {
    match field(fields, name) {
        "" => 0,
        raw => raw.parse().unwrap_or_else(|_| {
            warn!("request field {name} is not an integer: {raw}");
            0
        }),
    }
}

fn float_field(fields: &RequestFields, name: &str) -> f64 {
    match field(fields, name) {
        "" => 0.0,
        raw => raw.parse().unwrap_or_else(|_| {
            warn!("request field {name} is not a number: {raw}");
            0.0
        }),
    }
}

fn optional_float(fields: &RequestFields, name: &str) -> Option<f64> {
    match field(fields, name) {
        "" => None,
        raw => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("request field {name} is not a number: {raw}");
                None
            }
        },
    }
}
