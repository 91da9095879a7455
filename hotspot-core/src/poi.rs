//! The polymorphic POI entity model.
//!
//! A [`Poi`] is one augmented-reality point of interest. The persisted
//! `dimension` discriminant (1, 2 or 3) selects the concrete variant via
//! the closed [`Detail`] set: flat points carry no extra data, while 2-D
//! and 3-D POIs add altitude, a [`Transform`] and an [`Object3d`].
//!
//! Every entity constructs from a loosely-typed [`Record`] and enumerates
//! itself back into a wire-shaped record with the protocol's key names.
//! No field is dropped on the way out; eliding optional fields is the
//! protocol adapter's concern.

use serde_json::Value;

use crate::record::{self, Record, RecordError};

/// A point of interest with position, display text and actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    /// Storage identifier; `None` until first persisted.
    pub id: Option<String>,
    /// Title shown in the client interface.
    pub title: String,
    /// Second line of display text.
    pub line2: Option<String>,
    /// Third line of display text.
    pub line3: Option<String>,
    /// Fourth line of display text.
    pub line4: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Distance in meters between the user and this POI. Always
    /// server-computed; collectors overwrite it from the query, input
    /// sources are never trusted for it.
    pub distance: Option<f64>,
    /// URL of an image to show for this POI.
    pub image_url: Option<String>,
    /// Attribution text.
    pub attribution: Option<String>,
    /// Integer category code (selects custom icons client-side).
    pub poi_type: i64,
    /// Exclude this POI from indexing.
    pub do_not_index: bool,
    /// Whether the client should focus this POI.
    pub in_focus: bool,
    /// Show the small info window at the bottom of the screen.
    pub show_small_biw: bool,
    /// Show the big info window when the POI is tapped.
    pub show_biw_on_click: bool,
    /// Actions a client may invoke on this POI.
    pub actions: Vec<PoiAction>,
    /// Dimension-specific payload.
    pub detail: Detail,
}

/// Closed variant set selected by the `dimension` discriminant.
///
/// The discriminant is immutable once set; consumption sites match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Detail {
    /// Flat point, dimension 1. The default when `dimension` is absent.
    #[default]
    Point,
    /// Dimension 2: a flat object placed in space.
    TwoDimensional(Volume),
    /// Dimension 3: a full 3-D object.
    ThreeDimensional(Volume),
}

impl Detail {
    /// The numeric dimension code for the wire protocol.
    pub const fn dimension(&self) -> i64 {
        match self {
            Self::Point => 1,
            Self::TwoDimensional(_) => 2,
            Self::ThreeDimensional(_) => 3,
        }
    }

    /// The multidimensional payload, when this POI has one.
    pub const fn volume(&self) -> Option<&Volume> {
        match self {
            Self::Point => None,
            Self::TwoDimensional(volume) | Self::ThreeDimensional(volume) => Some(volume),
        }
    }
}

/// Payload shared by 2-D and 3-D POIs.
///
/// The transform and object are plain fields: when a source omits them,
/// default instances are substituted, so they are never absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Volume {
    /// Altitude in meters.
    pub alt: i64,
    /// Altitude difference with respect to the user's altitude, meters.
    pub relative_alt: i64,
    /// Placement transformation.
    pub transform: Transform,
    /// Object geometry reference.
    pub object: Object3d,
}

impl Volume {
    fn from_record(source: &Record) -> Result<Self, RecordError> {
        let transform = match record::entry(source, "transform")? {
            Some(nested) => Transform::from_record(nested)?,
            None => Transform::default(),
        };
        let object = match record::entry(source, "object")? {
            Some(nested) => Object3d::from_record(nested)?,
            None => Object3d::default(),
        };
        Ok(Self {
            alt: record::integer(source, "alt")?.unwrap_or(0),
            relative_alt: record::integer(source, "relativeAlt")?.unwrap_or(0),
            transform,
            object,
        })
    }
}

/// An action a client may invoke on a POI.
///
/// Whole-layer actions are outside this crate's scope, so the base action
/// fields live directly on the POI action.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiAction {
    /// URI invoked by activating this action.
    pub uri: String,
    /// Label to show in the interface.
    pub label: String,
    /// Content type of the target.
    pub content_type: Option<String>,
    /// HTTP method, `GET` by default.
    pub method: String,
    /// Activity type code.
    pub activity_type: Option<i64>,
    /// Ordered request parameter names to include in the call.
    pub params: Vec<String>,
    /// Close the info window after the action finishes.
    pub close_biw: bool,
    /// Show an activity indicator while the action completes.
    pub show_activity: bool,
    /// Message to show instead of the default spinner.
    pub activity_message: Option<String>,
    /// Range in meters for automatic triggering, when enabled.
    pub auto_trigger_range: Option<i64>,
    /// Only act on the automatic trigger, never on a tap.
    pub auto_trigger_only: bool,
}

impl Default for PoiAction {
    fn default() -> Self {
        Self {
            uri: String::new(),
            label: String::new(),
            content_type: None,
            method: "GET".to_owned(),
            activity_type: None,
            params: Vec::new(),
            close_biw: false,
            show_activity: true,
            activity_message: None,
            auto_trigger_range: None,
            auto_trigger_only: false,
        }
    }
}

impl PoiAction {
    /// Construct an action from a raw record.
    ///
    /// A zero or absent `autoTriggerRange` disables auto-triggering, and
    /// `autoTriggerOnly` is only honoured while a range is set.
    pub fn from_record(source: &Record) -> Result<Self, RecordError> {
        let auto_trigger_range = record::integer(source, "autoTriggerRange")?.filter(|r| *r != 0);
        let auto_trigger_only = if auto_trigger_range.is_some() {
            record::boolean(source, "autoTriggerOnly")?.unwrap_or(false)
        } else {
            false
        };
        Ok(Self {
            uri: record::text_or(source, "uri", "")?,
            label: record::text_or(source, "label", "")?,
            content_type: record::text(source, "contentType")?,
            method: record::text_or(source, "method", "GET")?,
            activity_type: record::integer(source, "activityType")?,
            params: record::list(source, "params")?,
            close_biw: record::boolean(source, "closeBiw")?.unwrap_or(false),
            show_activity: record::boolean(source, "showActivity")?.unwrap_or(true),
            activity_message: record::text(source, "activityMessage")?,
            auto_trigger_range,
            auto_trigger_only,
        })
    }

    /// Enumerate this action into a wire-shaped record.
    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("uri".to_owned(), Value::from(self.uri.clone()));
        out.insert("label".to_owned(), Value::from(self.label.clone()));
        out.insert("contentType".to_owned(), opt_text(&self.content_type));
        out.insert("method".to_owned(), Value::from(self.method.clone()));
        out.insert(
            "activityType".to_owned(),
            self.activity_type.map_or(Value::Null, Value::from),
        );
        out.insert(
            "params".to_owned(),
            Value::Array(self.params.iter().cloned().map(Value::from).collect()),
        );
        out.insert("closeBiw".to_owned(), Value::from(self.close_biw));
        out.insert("showActivity".to_owned(), Value::from(self.show_activity));
        out.insert("activityMessage".to_owned(), opt_text(&self.activity_message));
        out.insert(
            "autoTriggerRange".to_owned(),
            self.auto_trigger_range.map_or(Value::Null, Value::from),
        );
        out.insert(
            "autoTriggerOnly".to_owned(),
            Value::from(self.auto_trigger_only),
        );
        out
    }
}

/// 2-D/3-D object geometry reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Object3d {
    /// Base URL against which the other references resolve.
    pub base_url: String,
    /// Filename of the full-resolution object.
    pub full: String,
    /// Filename of a pre-scaled reduced object.
    pub reduced: Option<String>,
    /// Filename of an icon for viewing from afar.
    pub icon: Option<String>,
    /// Size in meters: the edge of the smallest containing cube.
    pub size: f64,
}

impl Default for Object3d {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            full: String::new(),
            reduced: None,
            icon: None,
            size: 0.0,
        }
    }
}

impl Object3d {
    /// Construct an object reference from a raw record. Empty `reduced`
    /// and `icon` names count as absent.
    pub fn from_record(source: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            base_url: record::text_or(source, "baseURL", "")?,
            full: record::text_or(source, "full", "")?,
            reduced: record::text(source, "reduced")?.filter(|s| !s.is_empty()),
            icon: record::text(source, "icon")?.filter(|s| !s.is_empty()),
            size: record::float(source, "size")?.unwrap_or(0.0),
        })
    }

    /// Enumerate this object reference into a wire-shaped record.
    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("baseURL".to_owned(), Value::from(self.base_url.clone()));
        out.insert("full".to_owned(), Value::from(self.full.clone()));
        out.insert("reduced".to_owned(), opt_text(&self.reduced));
        out.insert("icon".to_owned(), opt_text(&self.icon));
        out.insert("size".to_owned(), Value::from(self.size));
        out
    }
}

/// Placement transformation for multidimensional POIs.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Whether the transformation is relative to the viewer.
    pub rel: bool,
    /// Rotation angle in degrees around the z-axis.
    pub angle: f64,
    /// Scaling factor.
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rel: false,
            angle: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Construct a transform from a raw record.
    pub fn from_record(source: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            rel: record::boolean(source, "rel")?.unwrap_or(false),
            angle: record::float(source, "angle")?.unwrap_or(0.0),
            scale: record::float(source, "scale")?.unwrap_or(1.0),
        })
    }

    /// Enumerate this transform into a wire-shaped record.
    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("rel".to_owned(), Value::from(self.rel));
        out.insert("angle".to_owned(), Value::from(self.angle));
        out.insert("scale".to_owned(), Value::from(self.scale));
        out
    }
}

impl Default for Poi {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            line2: None,
            line3: None,
            line4: None,
            lat: 0.0,
            lon: 0.0,
            distance: None,
            image_url: None,
            attribution: None,
            poi_type: 0,
            do_not_index: false,
            in_focus: false,
            show_small_biw: true,
            show_biw_on_click: true,
            actions: Vec::new(),
            detail: Detail::Point,
        }
    }
}

impl Poi {
    /// A flat point with the given title and position, other fields at
    /// their defaults.
    pub fn point(title: &str, lat: f64, lon: f64) -> Self {
        Self {
            title: title.to_owned(),
            lat,
            lon,
            ..Self::default()
        }
    }

    /// Construct a POI from a raw record, dispatching on the `dimension`
    /// discriminant.
    ///
    /// `dimension` absent or `1` selects a flat point; `2` and `3` select
    /// the multidimensional variants; anything else fails with
    /// [`RecordError::InvalidDimension`].
    pub fn from_record(source: &Record) -> Result<Self, RecordError> {
        let detail = match record::integer(source, "dimension")? {
            None | Some(1) => Detail::Point,
            Some(2) => Detail::TwoDimensional(Volume::from_record(source)?),
            Some(3) => Detail::ThreeDimensional(Volume::from_record(source)?),
            Some(value) => return Err(RecordError::InvalidDimension { value }),
        };
        let actions = record::entries(source, "actions")?
            .into_iter()
            .map(PoiAction::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: record::text(source, "id")?,
            title: record::text_or(source, "title", "")?,
            line2: record::text(source, "line2")?,
            line3: record::text(source, "line3")?,
            line4: record::text(source, "line4")?,
            lat: record::float(source, "lat")?.unwrap_or(0.0),
            lon: record::float(source, "lon")?.unwrap_or(0.0),
            distance: record::float(source, "distance")?,
            image_url: record::text(source, "imageURL")?,
            attribution: record::text(source, "attribution")?,
            poi_type: record::integer(source, "type")?.unwrap_or(0),
            do_not_index: record::boolean(source, "doNotIndex")?.unwrap_or(false),
            in_focus: record::boolean(source, "inFocus")?.unwrap_or(false),
            show_small_biw: record::boolean(source, "showSmallBiw")?.unwrap_or(true),
            show_biw_on_click: record::boolean(source, "showBiwOnClick")?.unwrap_or(true),
            actions,
            detail,
        })
    }

    /// Enumerate this POI into a wire-shaped record.
    ///
    /// All fields of the concrete variant are present; nested entities
    /// recurse and the action list becomes a list of records. Optional
    /// field elision is applied later, by the protocol adapter.
    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("id".to_owned(), opt_text(&self.id));
        out.insert("title".to_owned(), Value::from(self.title.clone()));
        out.insert("line2".to_owned(), opt_text(&self.line2));
        out.insert("line3".to_owned(), opt_text(&self.line3));
        out.insert("line4".to_owned(), opt_text(&self.line4));
        out.insert("lat".to_owned(), Value::from(self.lat));
        out.insert("lon".to_owned(), Value::from(self.lon));
        out.insert(
            "distance".to_owned(),
            self.distance.map_or(Value::Null, Value::from),
        );
        out.insert("imageURL".to_owned(), opt_text(&self.image_url));
        out.insert("attribution".to_owned(), opt_text(&self.attribution));
        out.insert("type".to_owned(), Value::from(self.poi_type));
        out.insert("doNotIndex".to_owned(), Value::from(self.do_not_index));
        out.insert("inFocus".to_owned(), Value::from(self.in_focus));
        out.insert("showSmallBiw".to_owned(), Value::from(self.show_small_biw));
        out.insert(
            "showBiwOnClick".to_owned(),
            Value::from(self.show_biw_on_click),
        );
        out.insert(
            "actions".to_owned(),
            Value::Array(
                self.actions
                    .iter()
                    .map(|action| Value::Object(action.to_record()))
                    .collect(),
            ),
        );
        out.insert("dimension".to_owned(), Value::from(self.detail.dimension()));
        if let Some(volume) = self.detail.volume() {
            out.insert("alt".to_owned(), Value::from(volume.alt));
            out.insert("relativeAlt".to_owned(), Value::from(volume.relative_alt));
            out.insert(
                "transform".to_owned(),
                Value::Object(volume.transform.to_record()),
            );
            out.insert("object".to_owned(), Value::Object(volume.object.to_record()));
        }
        out
    }
}

fn opt_text(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("test record is a map")
    }

    #[rstest]
    #[case(json!({}), 1)]
    #[case(json!({"dimension": 1}), 1)]
    #[case(json!({"dimension": "2"}), 2)]
    #[case(json!({"dimension": 3}), 3)]
    fn dimension_dispatch_selects_variant(#[case] source: serde_json::Value, #[case] code: i64) {
        let poi = Poi::from_record(&record(source)).expect("valid dimension");
        assert_eq!(poi.detail.dimension(), code);
    }

    #[rstest]
    fn invalid_dimension_is_fatal() {
        let error = Poi::from_record(&record(json!({"dimension": 4}))).expect_err("dimension 4");
        assert_eq!(error.to_string(), "invalid dimension: 4");
    }

    #[rstest]
    #[case(json!({"doNotIndex": "false"}), true)]
    #[case(json!({"doNotIndex": "0"}), false)]
    #[case(json!({"doNotIndex": ""}), false)]
    fn flag_words_follow_the_stringified_value_rule(
        #[case] source: serde_json::Value,
        #[case] expected: bool,
    ) {
        let poi = Poi::from_record(&record(source)).expect("valid record");
        assert_eq!(poi.do_not_index, expected);
    }

    #[rstest]
    fn multidimensional_defaults_substitute_missing_sub_entities() {
        let poi = Poi::from_record(&record(json!({"dimension": 2}))).expect("valid record");
        let volume = poi.detail.volume().expect("2-D POI carries a volume");
        assert_eq!(volume.transform, Transform::default());
        assert_eq!(volume.object, Object3d::default());
        assert!((volume.transform.scale - 1.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn full_row_round_trips_through_the_record_shape() {
        let source = record(json!({
            "id": 7,
            "title": "Dom Tower",
            "line2": "Utrecht",
            "lat": "52.090737",
            "lon": 5.121420,
            "type": "2",
            "dimension": 3,
            "alt": 15,
            "relativeAlt": "3",
            "doNotIndex": 1,
            "transform": {"rel": 1, "angle": 90.0, "scale": "2.5"},
            "object": {"baseURL": "http://example.com/", "full": "tower.obj", "size": 95.0},
            "actions": [{"uri": "http://example.com/go", "label": "Visit", "params": "lat,lon"}],
        }));
        let poi = Poi::from_record(&source).expect("valid record");

        assert_eq!(poi.id.as_deref(), Some("7"));
        assert_eq!(poi.poi_type, 2);
        assert!(poi.do_not_index);
        assert!((poi.lat - 52.090737).abs() < 1e-12);
        let volume = poi.detail.volume().expect("3-D POI carries a volume");
        assert_eq!(volume.alt, 15);
        assert_eq!(volume.relative_alt, 3);
        assert!(volume.transform.rel);
        assert!((volume.transform.scale - 2.5).abs() < f64::EPSILON);
        assert_eq!(volume.object.full, "tower.obj");
        assert_eq!(poi.actions.len(), 1);
        assert_eq!(poi.actions[0].params, vec!["lat", "lon"]);
        assert_eq!(poi.actions[0].method, "GET");

        let wire = poi.to_record();
        assert_eq!(wire["dimension"], json!(3));
        assert_eq!(wire["alt"], json!(15));
        assert_eq!(wire["transform"]["scale"], json!(2.5));
        assert_eq!(wire["object"]["baseURL"], json!("http://example.com/"));
        assert_eq!(wire["actions"][0]["label"], json!("Visit"));
    }

    #[rstest]
    fn point_wire_record_has_no_volume_fields() {
        let wire = Poi::point("bench", 1.0, 2.0).to_record();
        assert_eq!(wire["dimension"], json!(1));
        for key in ["alt", "relativeAlt", "transform", "object"] {
            assert!(!wire.contains_key(key), "{key} must not appear on a point");
        }
        // Falsy optionals are still present here; the adapter elides them.
        assert_eq!(wire["inFocus"], json!(false));
        assert_eq!(wire["doNotIndex"], json!(false));
    }

    #[rstest]
    #[case(json!({"autoTriggerRange": 0, "autoTriggerOnly": 1}), None, false)]
    #[case(json!({"autoTriggerRange": "", "autoTriggerOnly": 1}), None, false)]
    #[case(json!({"autoTriggerRange": 25, "autoTriggerOnly": 1}), Some(25), true)]
    #[case(json!({"autoTriggerRange": 25}), Some(25), false)]
    fn auto_trigger_only_requires_a_range(
        #[case] source: serde_json::Value,
        #[case] range: Option<i64>,
        #[case] only: bool,
    ) {
        let action = PoiAction::from_record(&record(source)).expect("valid action");
        assert_eq!(action.auto_trigger_range, range);
        assert_eq!(action.auto_trigger_only, only);
    }

    #[rstest]
    fn distance_comes_only_from_the_record() {
        let poi = Poi::from_record(&record(json!({"title": "x"}))).expect("valid record");
        assert_eq!(poi.distance, None);
    }
}
