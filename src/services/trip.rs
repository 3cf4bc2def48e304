use tracing::info;

use crate::{
    error::AppError,
    models::{form::TripDraft, Trip, TripForm},
};

use super::storage::StorageService;

/// Trip CRUD over the flat trip collection.
///
/// Deleting a trip cascades to every itinerary whose `trip_id` names it.
#[derive(Clone)]
pub struct TripService {
    storage: StorageService,
}

impl TripService {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    pub async fn create(&self, form: &TripForm) -> Result<Trip, AppError> {
        let draft = checked_draft(form)?;

        let mut trip = Trip::new(draft.title, draft.start_date, draft.end_date);
        trip.description = draft.description;
        trip.destination = draft.destination;

        let _guard = self.storage.write_lock().await;
        let mut trips = self.storage.load_trips().await?;
        trips.push(trip.clone());
        self.storage.save_trips(&trips).await?;
        info!("created trip {}", trip.id);
        Ok(trip)
    }

    pub async fn list(&self) -> Result<Vec<Trip>, AppError> {
        self.storage.load_trips().await
    }

    pub async fn read(&self, id: &str) -> Result<Option<Trip>, AppError> {
        self.storage.trip_by_id(id).await
    }

    /// `Ok(None)` when no trip has that id.
    pub async fn update(&self, id: &str, form: &TripForm) -> Result<Option<Trip>, AppError> {
        let draft = checked_draft(form)?;

        let _guard = self.storage.write_lock().await;
        let mut trips = self.storage.load_trips().await?;
        let Some(trip) = trips.iter_mut().find(|trip| trip.id == id) else {
            return Ok(None);
        };
        trip.title = draft.title;
        trip.description = draft.description;
        trip.destination = draft.destination;
        trip.start_date = draft.start_date;
        trip.end_date = draft.end_date;
        trip.touch();

        let updated = trip.clone();
        self.storage.save_trips(&trips).await?;
        info!("updated trip {id}");
        Ok(Some(updated))
    }

    /// Removes the trip and its itineraries. Returns `false` when no trip has
    /// that id.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.storage.write_lock().await;
        let mut trips = self.storage.load_trips().await?;
        let before = trips.len();
        trips.retain(|trip| trip.id != id);
        if trips.len() == before {
            return Ok(false);
        }
        self.storage.save_trips(&trips).await?;

        let mut itineraries = self.storage.load_itineraries().await?;
        let owned = itineraries.len();
        itineraries.retain(|it| it.trip_id != id);
        let removed = owned - itineraries.len();
        if removed > 0 {
            self.storage.save_itineraries(&itineraries).await?;
        }
        info!("deleted trip {id} and {removed} itineraries");
        Ok(true)
    }
}

/// Parses the form and holds the trip to `start_date <= end_date`.
fn checked_draft(form: &TripForm) -> Result<TripDraft, AppError> {
    let draft = form.to_draft().map_err(AppError::Validation)?;
    draft.check_date_order().map_err(AppError::Validation)?;
    Ok(draft)
}
