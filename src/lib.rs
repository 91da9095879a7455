//! Facade crate for the Hotspot POI engine.
//!
//! This crate re-exports the core domain types, the collector interface,
//! and the protocol adapter, and exposes the SQLite collector behind a
//! feature flag.

#![forbid(unsafe_code)]

pub use hotspot_core::{
    CollectorError, Detail, EARTH_RADIUS, Object3d, Poi, PoiAction, PoiCollector, PoiQuery,
    Record, RecordError, StoreMode, Transform, Volume, haversine_distance,
};

#[cfg(feature = "store-sqlite")]
pub use hotspot_core::SqlitePoiCollector;

pub use hotspot_server::{
    CredentialVerifier, ERROR_CODE_DEFAULT, ERROR_CODE_NO_POIS, Filter, Layer, PoiServer,
    RequestError, RequestFields, SessionInfo, build_error_response, build_filter, build_response,
    validate_request,
};
