//! Failure taxonomy for a single `GetPOIs` request.

use hotspot_core::CollectorError;
use thiserror::Error;

/// Reasons a request cannot be answered with hotspots.
///
/// Validation variants carry the offending value so the error string sent
/// back to the client names the exact problem. Collector failures are kept
/// opaque; their detail is logged server side and never echoed to clients.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A required request field was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    /// The request named a layer this server does not carry.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    /// The developer id does not match the one configured for the layer.
    #[error("unknown developer id: {0}")]
    UnknownDeveloper(String),
    /// The developer hash failed verification for the layer.
    #[error("invalid developer hash")]
    InvalidCredential,
    /// Latitude was not a number in [-90, 90].
    #[error("invalid latitude: {0}")]
    InvalidLatitude(String),
    /// Longitude was not a number in [-180, 180].
    #[error("invalid longitude: {0}")]
    InvalidLongitude(String),
    /// The layer's collector failed to load points of interest.
    #[error(transparent)]
    Collector(#[from] CollectorError),
}
