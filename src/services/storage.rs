use std::sync::Arc;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{Itinerary, Trip},
};

use super::kv::{KeyValueStore, MemoryStore};

pub const TRIPS_KEY: &str = "wanderlust_trips";
pub const ITINERARIES_KEY: &str = "wanderlust_itineraries";

/// Reads and writes the trip and itinerary collections, each kept as a single
/// JSON array under its own key. Every write replaces the whole collection.
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Held by writers for a whole read-modify-write cycle so cycles from
    /// concurrent requests do not interleave.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub async fn load_trips(&self) -> Result<Vec<Trip>, AppError> {
        self.load_collection(TRIPS_KEY).await
    }

    pub async fn save_trips(&self, trips: &[Trip]) -> Result<(), AppError> {
        self.save_collection(TRIPS_KEY, trips).await
    }

    pub async fn trip_by_id(&self, id: &str) -> Result<Option<Trip>, AppError> {
        let trips = self.load_trips().await?;
        Ok(trips.into_iter().find(|trip| trip.id == id))
    }

    pub async fn load_itineraries(&self) -> Result<Vec<Itinerary>, AppError> {
        self.load_collection(ITINERARIES_KEY).await
    }

    pub async fn save_itineraries(&self, itineraries: &[Itinerary]) -> Result<(), AppError> {
        self.save_collection(ITINERARIES_KEY, itineraries).await
    }

    pub async fn itinerary_by_id(&self, id: &str) -> Result<Option<Itinerary>, AppError> {
        let itineraries = self.load_itineraries().await?;
        Ok(itineraries.into_iter().find(|it| it.id == id))
    }

    pub async fn itineraries_by_trip_id(&self, trip_id: &str) -> Result<Vec<Itinerary>, AppError> {
        let itineraries = self.load_itineraries().await?;
        Ok(itineraries
            .into_iter()
            .filter(|it| it.trip_id == trip_id)
            .collect())
    }

    /// Stores the "European Adventure" sample trip when no trips exist yet.
    pub async fn seed_sample_data(&self) -> Result<Option<Trip>, AppError> {
        let _guard = self.write_lock().await;
        if !self.load_trips().await?.is_empty() {
            return Ok(None);
        }
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(2024, 6, 1),
            NaiveDate::from_ymd_opt(2024, 6, 15),
        ) else {
            return Ok(None);
        };
        let mut trip = Trip::new("European Adventure", start, end);
        trip.description = "A wonderful journey through Europe".into();
        self.save_trips(std::slice::from_ref(&trip)).await?;
        info!("seeded sample trip {}", trip.id);
        Ok(Some(trip))
    }

    async fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!("discarding unreadable collection under {key}: {err}");
                Ok(Vec::new())
            }
        }
    }

    async fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), AppError> {
        let data = serde_json::to_string(items)?;
        self.store.set(key, &data).await
    }
}
