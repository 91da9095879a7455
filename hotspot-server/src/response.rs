//! Assembly of the JSON body sent back to clients.

use hotspot_core::{Poi, Record};
use serde_json::Value;

/// Error code reported for any failure other than an empty result set.
pub const ERROR_CODE_DEFAULT: i64 = 20;
/// Error code reported when no points of interest matched the query.
pub const ERROR_CODE_NO_POIS: i64 = 21;

const MESSAGE_OK: &str = "ok";
const MESSAGE_DEFAULT: &str = "An error occurred";
const MESSAGE_NO_POIS: &str = "No POIs found. Increase range or adjust filters to see POIs";
const LAYER_UNSPECIFIED: &str = "unspecified";

/// Clients draw the search circle slightly wider than requested so edge
/// hotspots are not clipped.
const RADIUS_MARGIN: f64 = 1.25;

/// Builds a success body from the collector's results.
///
/// An empty result set is not a success on the wire; it becomes an
/// [`ERROR_CODE_NO_POIS`] body instead. When `requested_poi_id` matches one
/// of the results that hotspot is marked as being in focus before
/// serialization. The echoed radius, when one was requested, is inflated by
/// 25% and truncated to a whole number of metres.
#[must_use]
pub fn build_response(
    pois: &mut [Poi],
    more_pages: bool,
    next_page_key: Option<&str>,
    radius: Option<i64>,
    requested_poi_id: Option<&str>,
    layer_name: &str,
) -> Value {
    if pois.is_empty() {
        return build_error_response(ERROR_CODE_NO_POIS, None, Some(layer_name));
    }
    let mut response = Record::new();
    response.insert("layer".to_owned(), Value::from(layer_name.to_owned()));
    response.insert("errorCode".to_owned(), Value::from(0));
    response.insert("errorString".to_owned(), Value::from(MESSAGE_OK));
    response.insert("morePages".to_owned(), Value::from(more_pages));
    response.insert(
        "nextPageKey".to_owned(),
        Value::from(next_page_key.unwrap_or("").to_owned()),
    );
    if let Some(radius) = radius {
        response.insert(
            "radius".to_owned(),
            Value::from((radius as f64 * RADIUS_MARGIN) as i64),
        );
    }
    let hotspots = pois
        .iter_mut()
        .map(|poi| {
            if requested_poi_id.is_some() && poi.id.as_deref() == requested_poi_id {
                poi.in_focus = true;
            }
            let mut record = poi.to_record();
            shape_hotspot(&mut record);
            Value::Object(record)
        })
        .collect();
    response.insert("hotspots".to_owned(), Value::Array(hotspots));
    Value::Object(response)
}

/// Builds an error body.
///
/// `message` overrides the fixed string for the given code; `layer_name`
/// falls back to `"unspecified"` when absent, so even a request that never
/// named a valid layer gets a well-formed body.
#[must_use]
pub fn build_error_response(code: i64, message: Option<&str>, layer_name: Option<&str>) -> Value {
    let default_message = match code {
        ERROR_CODE_NO_POIS => MESSAGE_NO_POIS,
        _ => MESSAGE_DEFAULT,
    };
    let mut response = Record::new();
    response.insert(
        "layer".to_owned(),
        Value::from(
            layer_name
                .filter(|name| !name.is_empty())
                .unwrap_or(LAYER_UNSPECIFIED)
                .to_owned(),
        ),
    );
    response.insert("errorCode".to_owned(), Value::from(code));
    response.insert(
        "errorString".to_owned(),
        Value::from(
            message
                .filter(|text| !text.is_empty())
                .unwrap_or(default_message)
                .to_owned(),
        ),
    );
    response.insert("morePages".to_owned(), Value::from(false));
    response.insert("nextPageKey".to_owned(), Value::Null);
    response.insert("hotspots".to_owned(), Value::Array(Vec::new()));
    Value::Object(response)
}

/// Rewrites one hotspot record into its wire shape.
///
/// Falsy optional keys are elided, auto-trigger fields travel as a pair,
/// coordinates become integer microdegrees, and `type` and `distance` are
/// forced to their numeric wire types.
fn shape_hotspot(record: &mut Record) {
    for key in ["inFocus", "alt", "relativeAlt", "doNotIndex"] {
        if is_falsy(record.get(key)) {
            record.remove(key);
        }
    }
    if let Some(Value::Array(actions)) = record.get_mut("actions") {
        for action in actions {
            if let Value::Object(action) = action {
                if is_falsy(action.get("autoTriggerRange")) {
                    action.remove("autoTriggerRange");
                    action.remove("autoTriggerOnly");
                }
            }
        }
    }
    for key in ["lat", "lon"] {
        let degrees = record.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        record.insert(key.to_owned(), Value::from(to_microdegrees(degrees)));
    }
    let poi_type = record.get("type").map_or(0, coerce_integer);
    record.insert("type".to_owned(), Value::from(poi_type));
    let distance = record.get("distance").map_or(0.0, coerce_float);
    record.insert("distance".to_owned(), Value::from(distance));
}

/// Degrees to integer microdegrees, truncated toward zero.
fn to_microdegrees(degrees: f64) -> i64 {
    (degrees * 1_000_000.0) as i64
}

fn coerce_integer(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number.as_i64().unwrap_or(0),
        Value::String(text) => text.parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_float(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The wire treats empty and zero-like values as absent.
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(Value::String(text)) => text.is_empty() || text == "0",
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}
