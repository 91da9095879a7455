//! Core domain model and storage contracts for the Hotspot POI engine.
//!
//! The crate covers three concerns:
//! - the polymorphic POI entity model with uniform construction from
//!   loosely-typed records and enumeration back into wire-shaped maps
//!   ([`Poi`], [`Detail`], [`Record`]);
//! - great-circle geometry ([`haversine_distance`]);
//! - the collector contract translating between persisted rows and typed
//!   POI graphs ([`PoiCollector`]), with a SQLite implementation behind
//!   the `store-sqlite` feature.

#![forbid(unsafe_code)]

mod collector;
mod geo;
mod poi;
mod record;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(feature = "store-sqlite")]
pub use collector::SqlitePoiCollector;
pub use collector::{CollectorError, PoiCollector, PoiQuery, StoreMode};
pub use self::geo::{EARTH_RADIUS, haversine_distance};
pub use poi::{Detail, Object3d, Poi, PoiAction, Transform, Volume};
pub use record::{Record, RecordError};
