//! Storage access contracts for POI collectors.
//!
//! A collector translates between a persistence medium and typed [`Poi`]
//! graphs. Implementations vary by medium (relational here; flat-file and
//! markup connectors live elsewhere) but honour identical input/output
//! contracts: queries compute distance server-side, and stores persist
//! the POI together with its sub-entities.

use geo::Coord;
use thiserror::Error;

use crate::poi::Poi;
use crate::record::RecordError;

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqlitePoiCollector;

/// Geospatial query parameters for [`PoiCollector::get_pois`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiQuery {
    /// Query origin, `x = longitude`, `y = latitude`, in degrees.
    pub origin: Coord<f64>,
    /// Acceptance radius in meters. `0` disables the distance
    /// restriction: every row is a candidate.
    pub radius: i64,
    /// Client-reported position uncertainty in meters. Widens the
    /// acceptance band, never narrows it.
    pub accuracy: i64,
}

impl PoiQuery {
    /// Build a query around `origin`.
    pub const fn new(origin: Coord<f64>, radius: i64, accuracy: i64) -> Self {
        Self {
            origin,
            radius,
            accuracy,
        }
    }
}

/// Write behaviour for [`PoiCollector::store_pois`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Per-POI upsert: a POI without an id is inserted; a POI with an
    /// unknown id is inserted; a known id is updated in place.
    #[default]
    Update,
    /// Truncate every POI and sub-entity table, then insert all supplied
    /// POIs.
    Replace,
}

/// Errors raised by collector implementations.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The underlying storage driver failed. Carries the driver's
    /// message for logs; it must not be echoed to clients.
    #[error("storage error: {message}")]
    Storage {
        /// Message reported by the storage driver.
        message: String,
    },
    /// A persisted record could not be mapped onto a typed POI. Fatal
    /// for that record; never silently skipped.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Translate between persisted rows and typed POI graphs.
pub trait PoiCollector {
    /// Fetch POIs around the query origin with server-computed distance.
    ///
    /// Every returned POI carries a `distance` in meters from
    /// `query.origin`. With a positive radius only POIs with
    /// `distance < radius + accuracy` are returned; a zero radius
    /// returns all rows.
    fn get_pois(&self, query: &PoiQuery) -> Result<Vec<Poi>, CollectorError>;

    /// Persist POIs according to `mode`.
    ///
    /// Inserted POIs receive their storage-generated id. Sub-entities
    /// (actions, object, transform) are fully replaced on every save,
    /// never partially patched.
    fn store_pois(&mut self, pois: &mut [Poi], mode: StoreMode) -> Result<(), CollectorError>;
}
