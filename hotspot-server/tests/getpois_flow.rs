//! End-to-end flow: request fields in, JSON body out, backed by SQLite.

use std::collections::HashMap;

use hotspot_core::{Detail, Poi, PoiAction, PoiCollector, SqlitePoiCollector, StoreMode, Volume};
use hotspot_server::{
    CredentialVerifier, ERROR_CODE_DEFAULT, ERROR_CODE_NO_POIS, Layer, PoiServer, RequestFields,
    SessionInfo,
};
use serde_json::{Value, json};

/// Accepts a hash equal to the shared secret joined with the timestamp.
struct SharedSecret(&'static str);

impl CredentialVerifier for SharedSecret {
    fn verify(&self, developer_hash: &str, timestamp: &str) -> bool {
        developer_hash == format!("{secret}:{timestamp}", secret = self.0)
    }
}

fn seed_pois() -> Vec<Poi> {
    let mut tower = Poi::point("Dom Tower", 52.090737, 5.121420);
    tower.poi_type = 1;
    tower.image_url = Some("http://example.net/tower.jpg".to_owned());
    tower.actions = vec![PoiAction {
        uri: "http://example.net/ring".to_owned(),
        label: "Ring the bells".to_owned(),
        auto_trigger_range: Some(50),
        auto_trigger_only: true,
        ..PoiAction::default()
    }];

    let mut statue = Poi::point("Statue", 52.091000, 5.121000);
    statue.poi_type = 2;
    statue.detail = Detail::ThreeDimensional(Volume {
        alt: 12,
        relative_alt: -3,
        ..Volume::default()
    });

    // Roughly 800 m north of the tower, outside a 250 m search.
    let far = Poi::point("Far Gate", 52.097937, 5.121420);

    vec![tower, statue, far]
}

fn sqlite_server() -> PoiServer {
    let mut collector = SqlitePoiCollector::open_in_memory().expect("open collector");
    let mut pois = seed_pois();
    collector
        .store_pois(&mut pois, StoreMode::Replace)
        .expect("seed pois");
    let mut server = PoiServer::new();
    server.add_layer(Layer::new(
        "monuments",
        "dev-1",
        Box::new(SharedSecret("s3cret")),
        Box::new(collector),
    ));
    server
}

fn request_fields() -> RequestFields {
    [
        ("userId", "user-1"),
        ("developerId", "dev-1"),
        ("developerHash", "s3cret:1700000000"),
        ("timestamp", "1700000000"),
        ("layerName", "monuments"),
        ("lat", "52.090737"),
        ("lon", "5.121420"),
        ("radius", "250"),
        ("accuracy", "10"),
        ("lang", "en"),
        ("countryCode", "NL"),
        ("version", "6.0"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect()
}

fn hotspots(body: &Value) -> &Vec<Value> {
    body.get("hotspots")
        .and_then(Value::as_array)
        .expect("body should carry a hotspots array")
}

fn hotspot<'a>(body: &'a Value, title: &str) -> &'a Value {
    hotspots(body)
        .iter()
        .find(|spot| spot["title"] == json!(title))
        .unwrap_or_else(|| panic!("hotspot {title} should be present"))
}

#[test]
fn bounded_search_returns_shaped_hotspots() {
    let server = sqlite_server();
    let mut fields = request_fields();
    let body = server.handle_request(&mut fields, &SessionInfo::default());

    assert_eq!(body["errorCode"], json!(0));
    assert_eq!(body["errorString"], json!("ok"));
    assert_eq!(body["layer"], json!("monuments"));
    assert_eq!(body["morePages"], json!(false));
    assert_eq!(body["radius"], json!(312));
    assert_eq!(hotspots(&body).len(), 2, "the far gate should be filtered");

    let tower = hotspot(&body, "Dom Tower");
    assert_eq!(tower["lat"], json!(52_090_737));
    assert_eq!(tower["lon"], json!(5_121_420));
    assert_eq!(tower["type"], json!(1));
    assert_eq!(tower["dimension"], json!(1));
    assert_eq!(tower["imageURL"], json!("http://example.net/tower.jpg"));
    assert!(tower.get("inFocus").is_none());
    assert!(tower.get("alt").is_none());
    let actions = tower["actions"].as_array().expect("actions array");
    assert_eq!(actions[0]["autoTriggerRange"], json!(50));
    assert_eq!(actions[0]["autoTriggerOnly"], json!(true));

    let statue = hotspot(&body, "Statue");
    assert_eq!(statue["dimension"], json!(3));
    assert_eq!(statue["alt"], json!(12));
    assert_eq!(statue["relativeAlt"], json!(-3));
    assert!(statue["object"].is_object());
    assert!(statue["transform"].is_object());
    assert!(statue["distance"].as_f64().expect("distance") > 0.0);
}

#[test]
fn unbounded_search_returns_everything_without_a_radius() {
    let server = sqlite_server();
    let mut fields = request_fields();
    fields.insert("radius".to_owned(), "0".to_owned());
    let body = server.handle_request(&mut fields, &SessionInfo::default());
    assert_eq!(body["errorCode"], json!(0));
    assert!(body.get("radius").is_none());
    assert_eq!(hotspots(&body).len(), 3);
}

#[test]
fn requested_poi_is_marked_in_focus() {
    let server = sqlite_server();
    let mut probe = request_fields();
    let listing = server.handle_request(&mut probe, &SessionInfo::default());
    let tower_id = hotspot(&listing, "Dom Tower")["id"]
        .as_str()
        .expect("id string")
        .to_owned();

    let mut fields = request_fields();
    fields.insert("requestedPoiId".to_owned(), tower_id);
    let body = server.handle_request(&mut fields, &SessionInfo::default());
    assert_eq!(hotspot(&body, "Dom Tower")["inFocus"], json!(true));
    assert!(hotspot(&body, "Statue").get("inFocus").is_none());
}

#[test]
fn empty_area_reports_no_pois() {
    let server = sqlite_server();
    let mut fields = request_fields();
    fields.insert("lat".to_owned(), "-52.090737".to_owned());
    let body = server.handle_request(&mut fields, &SessionInfo::default());
    assert_eq!(body["errorCode"], json!(ERROR_CODE_NO_POIS));
    assert_eq!(
        body["errorString"],
        json!("No POIs found. Increase range or adjust filters to see POIs")
    );
    assert!(hotspots(&body).is_empty());
}

#[test]
fn bad_credentials_are_rejected() {
    let server = sqlite_server();
    let mut fields = request_fields();
    fields.insert("developerHash".to_owned(), "wrong:1700000000".to_owned());
    let body = server.handle_request(&mut fields, &SessionInfo::default());
    assert_eq!(body["errorCode"], json!(ERROR_CODE_DEFAULT));
    assert_eq!(body["errorString"], json!("invalid developer hash"));
    assert_eq!(body["layer"], json!("monuments"));
}
