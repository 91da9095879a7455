//! Request handling for the `GetPOIs` wire protocol.
//!
//! A [`PoiServer`] owns a set of named [`Layer`]s, each pairing developer
//! credentials with a [`PoiCollector`](hotspot_core::PoiCollector). One call
//! to [`PoiServer::handle_request`] takes the decoded request fields and
//! returns the complete JSON response body, success or error alike; the
//! transport in front of it only has to decode the query string and write
//! the body back with an `application/json` content type.

#![forbid(unsafe_code)]

mod error;
mod filter;
mod layer;
mod request;
mod response;

use std::collections::HashMap;

use log::{debug, error};
use serde_json::Value;

pub use crate::error::RequestError;
pub use crate::filter::Filter;
pub use crate::layer::{CredentialVerifier, Layer};
pub use crate::request::{
    OPTIONAL_FIELDS, REQUIRED_FIELDS, RequestFields, SessionInfo, build_filter, validate_request,
};
pub use crate::response::{
    ERROR_CODE_DEFAULT, ERROR_CODE_NO_POIS, build_error_response, build_response,
};

/// Serves `GetPOIs` requests for a set of configured layers.
#[derive(Debug, Default)]
pub struct PoiServer {
    layers: HashMap<String, Layer>,
}

impl PoiServer {
    /// Creates a server with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer, replacing any previous layer with the same name.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.insert(layer.name().to_owned(), layer);
    }

    /// Looks up a registered layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Mutable access to a registered layer, for ingest paths.
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.get_mut(name)
    }

    /// Answers one request, always producing a well-formed body.
    ///
    /// Validation failures are echoed in the error string so the requester
    /// can fix their call. Collector failures are logged here and reported
    /// to the client as the generic error, keeping storage detail out of
    /// responses.
    pub fn handle_request(&self, fields: &mut RequestFields, session: &SessionInfo) -> Value {
        let layer_name = fields
            .get("layerName")
            .filter(|name| !name.is_empty())
            .cloned();
        match self.process(fields, session) {
            Ok(body) => body,
            Err(RequestError::Collector(source)) => {
                error!(
                    "collector failure serving layer {layer}: {source}",
                    layer = layer_name.as_deref().unwrap_or("unspecified")
                );
                build_error_response(ERROR_CODE_DEFAULT, None, layer_name.as_deref())
            }
            Err(source) => {
                build_error_response(ERROR_CODE_DEFAULT, Some(&source.to_string()), layer_name.as_deref())
            }
        }
    }

    fn process(
        &self,
        fields: &mut RequestFields,
        session: &SessionInfo,
    ) -> Result<Value, RequestError> {
        validate_request(fields, &self.layers)?;
        let filter = build_filter(fields, session);
        if let Ok(snapshot) = serde_json::to_string(&filter) {
            debug!("serving filter {snapshot}");
        }
        let layer = self
            .layers
            .get(&filter.layer_name)
            .ok_or_else(|| RequestError::UnknownLayer(filter.layer_name.clone()))?;
        let mut pois = layer.collector().get_pois(&filter.query())?;
        Ok(build_response(
            &mut pois,
            false,
            None,
            filter.radius_hint(),
            filter.requested_poi_id.as_deref(),
            &filter.layer_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use hotspot_core::test_support::MemoryCollector;
    use hotspot_core::{CollectorError, Poi, PoiCollector, PoiQuery, StoreMode};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    struct AcceptAll;

    impl CredentialVerifier for AcceptAll {
        fn verify(&self, _developer_hash: &str, _timestamp: &str) -> bool {
            true
        }
    }

    struct BrokenCollector;

    impl PoiCollector for BrokenCollector {
        fn get_pois(&self, _query: &PoiQuery) -> Result<Vec<Poi>, CollectorError> {
            Err(CollectorError::Storage {
                message: "disk on fire".to_owned(),
            })
        }

        fn store_pois(
            &mut self,
            _pois: &mut [Poi],
            _mode: StoreMode,
        ) -> Result<(), CollectorError> {
            Err(CollectorError::Storage {
                message: "disk on fire".to_owned(),
            })
        }
    }

    fn request_fields() -> RequestFields {
        [
            ("userId", "user-1"),
            ("developerId", "dev-1"),
            ("developerHash", "hash"),
            ("timestamp", "1700000000"),
            ("layerName", "monuments"),
            ("lat", "52.090737"),
            ("lon", "5.121420"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
    }

    #[fixture]
    fn server() -> PoiServer {
        let mut poi = Poi::point("Dom Tower", 52.090737, 5.121420);
        poi.poi_type = 1;
        let mut server = PoiServer::new();
        server.add_layer(Layer::new(
            "monuments",
            "dev-1",
            Box::new(AcceptAll),
            Box::new(MemoryCollector::with_poi(poi)),
        ));
        server
    }

    #[rstest]
    fn serves_hotspots_for_a_valid_request(server: PoiServer) {
        let mut fields = request_fields();
        let body = server.handle_request(&mut fields, &SessionInfo::default());
        assert_eq!(body["errorCode"], json!(0));
        assert_eq!(body["layer"], json!("monuments"));
        let hotspots = body["hotspots"].as_array().expect("hotspots array");
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0]["title"], json!("Dom Tower"));
        assert_eq!(hotspots[0]["lat"], json!(52_090_737));
    }

    #[rstest]
    fn validation_failure_is_echoed_as_error_twenty(server: PoiServer) {
        let mut fields = request_fields();
        fields.remove("lat");
        let body = server.handle_request(&mut fields, &SessionInfo::default());
        assert_eq!(body["errorCode"], json!(ERROR_CODE_DEFAULT));
        assert_eq!(body["errorString"], json!("missing parameter: lat"));
        assert_eq!(body["layer"], json!("monuments"));
    }

    #[rstest]
    fn unknown_layer_gets_the_unspecified_fallback(server: PoiServer) {
        let mut fields = request_fields();
        fields.insert("layerName".to_owned(), String::new());
        let body = server.handle_request(&mut fields, &SessionInfo::default());
        assert_eq!(body["errorCode"], json!(ERROR_CODE_DEFAULT));
        assert_eq!(body["layer"], json!("unspecified"));
    }

    #[rstest]
    fn collector_failure_stays_generic() {
        let mut server = PoiServer::new();
        server.add_layer(Layer::new(
            "monuments",
            "dev-1",
            Box::new(AcceptAll),
            Box::new(BrokenCollector),
        ));
        let mut fields = request_fields();
        let body = server.handle_request(&mut fields, &SessionInfo::default());
        assert_eq!(body["errorCode"], json!(ERROR_CODE_DEFAULT));
        assert_eq!(body["errorString"], json!("An error occurred"));
        assert!(!body["errorString"]
            .as_str()
            .expect("error string")
            .contains("disk"));
    }

    #[rstest]
    fn empty_area_reports_error_twenty_one(server: PoiServer) {
        let mut fields = request_fields();
        fields.insert("lat".to_owned(), "-52.090737".to_owned());
        fields.insert("radius".to_owned(), "100".to_owned());
        let body = server.handle_request(&mut fields, &SessionInfo::default());
        assert_eq!(body["errorCode"], json!(ERROR_CODE_NO_POIS));
        assert_eq!(body["layer"], json!("monuments"));
    }
}
