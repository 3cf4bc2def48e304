//! Points of interest picked on the map during a planning session.
//!
//! A pick starts out pending and stays on the board until it is confirmed or
//! removed. The board is not persisted.

use tracing::debug;

use crate::models::Poi;

const PICKED_NAME: &str = "Point of Interest";

#[derive(Debug, Clone, Default)]
pub struct PoiBoard {
    pois: Vec<Poi>,
}

impl PoiBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins a pending POI at a clicked map position; its address is the
    /// position itself.
    pub fn pick_location(&mut self, longitude: f64, latitude: f64) -> Poi {
        let mut poi = Poi::new(PICKED_NAME);
        poi.longitude = Some(longitude);
        poi.latitude = Some(latitude);
        poi.address = Some(format!("{latitude:.4}, {longitude:.4}"));
        poi.confirmed = Some(false);
        self.push(poi)
    }

    /// Pins a pending POI from a place search hit.
    pub fn add_search_result(
        &mut self,
        name: impl Into<String>,
        longitude: f64,
        latitude: f64,
        address: impl Into<String>,
    ) -> Poi {
        let mut poi = Poi::new(name);
        poi.longitude = Some(longitude);
        poi.latitude = Some(latitude);
        poi.address = Some(address.into());
        poi.confirmed = Some(false);
        self.push(poi)
    }

    pub fn confirm(&mut self, id: &str) -> bool {
        match self.pois.iter_mut().find(|poi| poi.id == id) {
            Some(poi) => {
                poi.confirmed = Some(true);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.pois.len();
        self.pois.retain(|poi| poi.id != id);
        self.pois.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Poi> {
        self.pois.iter().find(|poi| poi.id == id)
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &Poi> {
        self.pois.iter().filter(|poi| poi.is_confirmed())
    }

    pub fn pending_count(&self) -> usize {
        self.pois.iter().filter(|poi| !poi.is_confirmed()).count()
    }

    fn push(&mut self, poi: Poi) -> Poi {
        debug!("pinned poi {} ({})", poi.id, poi.name);
        self.pois.push(poi.clone());
        poi
    }
}
