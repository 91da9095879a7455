//! A layer binds a published name to its credentials and its collector.

use core::fmt;

use hotspot_core::PoiCollector;

/// Checks the developer hash presented with a request.
///
/// Implementations decide the scheme; a typical one hashes a shared secret
/// together with the request timestamp and compares digests.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `true` when `developer_hash` is valid for `timestamp`.
    fn verify(&self, developer_hash: &str, timestamp: &str) -> bool;
}

/// One named layer served by a [`PoiServer`](crate::PoiServer).
pub struct Layer {
    name: String,
    developer_id: String,
    verifier: Box<dyn CredentialVerifier>,
    collector: Box<dyn PoiCollector>,
}

impl Layer {
    /// Assembles a layer from its published name, the developer id allowed
    /// to query it, a credential verifier, and the collector backing it.
    pub fn new(
        name: impl Into<String>,
        developer_id: impl Into<String>,
        verifier: Box<dyn CredentialVerifier>,
        collector: Box<dyn PoiCollector>,
    ) -> Self {
        Self {
            name: name.into(),
            developer_id: developer_id.into(),
            verifier,
            collector,
        }
    }

    /// The name clients pass as `layerName`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The developer id this layer accepts.
    #[must_use]
    pub fn developer_id(&self) -> &str {
        &self.developer_id
    }

    /// The verifier used to check developer hashes.
    #[must_use]
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    /// The collector that answers queries for this layer.
    #[must_use]
    pub fn collector(&self) -> &dyn PoiCollector {
        self.collector.as_ref()
    }

    /// Mutable access to the collector, for ingest and maintenance paths.
    pub fn collector_mut(&mut self) -> &mut dyn PoiCollector {
        self.collector.as_mut()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("developer_id", &self.developer_id)
            .finish_non_exhaustive()
    }
}
