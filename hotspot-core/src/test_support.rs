//! Test-only, in-memory [`PoiCollector`] implementation used by unit and
//! behaviour tests.

use geo::Coord;

use crate::collector::{CollectorError, PoiCollector, PoiQuery, StoreMode};
use crate::geo::haversine_distance;
use crate::poi::Poi;

/// In-memory `PoiCollector` implementation used in tests.
///
/// The collector performs a linear scan and is intended only for small
/// datasets.
#[derive(Default, Debug)]
pub struct MemoryCollector {
    pois: Vec<Poi>,
    next_id: u64,
}

impl MemoryCollector {
    /// Create a collector containing a single POI.
    pub fn with_poi(poi: Poi) -> Self {
        Self::with_pois(std::iter::once(poi))
    }

    /// Create a collector from a collection of POIs.
    pub fn with_pois<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = Poi>,
    {
        let mut collector = Self::default();
        let mut seeded: Vec<Poi> = pois.into_iter().collect();
        collector
            .store_pois(&mut seeded, StoreMode::Replace)
            .unwrap_or_default();
        collector
    }

    fn assign_id(&mut self, poi: &mut Poi) {
        if poi.id.is_none() {
            self.next_id += 1;
            poi.id = Some(self.next_id.to_string());
        }
    }
}

impl PoiCollector for MemoryCollector {
    fn get_pois(&self, query: &PoiQuery) -> Result<Vec<Poi>, CollectorError> {
        let band = (query.radius + query.accuracy) as f64;
        Ok(self
            .pois
            .iter()
            .cloned()
            .map(|mut poi| {
                let here = Coord {
                    x: poi.lon,
                    y: poi.lat,
                };
                poi.distance = Some(haversine_distance(query.origin, here));
                poi
            })
            .filter(|poi| {
                query.radius == 0 || poi.distance.is_some_and(|distance| distance < band)
            })
            .collect())
    }

    fn store_pois(&mut self, pois: &mut [Poi], mode: StoreMode) -> Result<(), CollectorError> {
        if mode == StoreMode::Replace {
            self.pois.clear();
        }
        for poi in pois.iter_mut() {
            self.assign_id(poi);
            match self.pois.iter_mut().find(|existing| existing.id == poi.id) {
                Some(existing) => *existing = poi.clone(),
                None => self.pois.push(poi.clone()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn computes_distance_and_filters_on_band() {
        let collector = MemoryCollector::with_pois([
            Poi::point("here", 0.0, 0.0),
            Poi::point("far", 10.0, 10.0),
        ]);
        let query = PoiQuery::new(Coord { x: 0.0, y: 0.0 }, 1000, 0);
        let found = collector.get_pois(&query).expect("query");
        assert_eq!(found.len(), 1);
        assert!(found[0].distance.expect("distance set") < 1e-9);
    }
}
