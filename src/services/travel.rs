//! In-session trip planner: trips with their itineraries embedded.
//!
//! The whole collection lives behind an `Arc<[TripAggregate]>` that is never
//! mutated in place. Each effective mutation publishes a fresh `Arc` on a
//! [`watch`] channel, so subscribers can compare snapshots with
//! [`Arc::ptr_eq`]. Lookups for unknown ids leave the snapshot untouched and
//! wake nobody.
//!
//! Persisting merges the snapshot into the flat collections by id. Records the
//! planner never held are left alone, so trips and itineraries written through
//! the flat services survive a persist.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::AppError,
    models::{
        form::{ItineraryDraft, TripDraft},
        Itinerary, ItineraryPatch, Trip, TripAggregate, TripPatch,
    },
    validation::{check_date_order, validate_itinerary_record},
};

use super::storage::StorageService;

pub type TripsSnapshot = Arc<[TripAggregate]>;

#[derive(Clone)]
pub struct TravelState {
    trips: Arc<watch::Sender<TripsSnapshot>>,
    removed: Arc<Mutex<RemovedIds>>,
}

/// Ids deleted in the session, so a persist can drop them from the flat store.
#[derive(Debug, Clone, Default)]
struct RemovedIds {
    trips: HashSet<String>,
    itineraries: HashSet<String>,
}

impl Default for TravelState {
    fn default() -> Self {
        Self::new()
    }
}

impl TravelState {
    pub fn new() -> Self {
        Self::from_aggregates(Vec::new())
    }

    pub fn from_aggregates(trips: Vec<TripAggregate>) -> Self {
        let (sender, _) = watch::channel(TripsSnapshot::from(trips));
        Self {
            trips: Arc::new(sender),
            removed: Arc::default(),
        }
    }

    /// Builds the session state from the flat stored collections.
    /// Itineraries whose trip no longer exists are left out.
    pub async fn load(storage: &StorageService) -> Result<Self, AppError> {
        let trips = storage.load_trips().await?;
        let itineraries = storage.load_itineraries().await?;

        let mut aggregates: Vec<TripAggregate> = trips.into_iter().map(TripAggregate::new).collect();
        let positions: HashMap<String, usize> = aggregates
            .iter()
            .enumerate()
            .map(|(i, agg)| (agg.trip.id.clone(), i))
            .collect();
        for itinerary in itineraries {
            match positions.get(&itinerary.trip_id) {
                Some(&i) => aggregates[i].itineraries.push(itinerary),
                None => warn!(
                    "dropping itinerary {} of missing trip {}",
                    itinerary.id, itinerary.trip_id
                ),
            }
        }
        Ok(Self::from_aggregates(aggregates))
    }

    /// Merges the current snapshot into the flat stored collections.
    ///
    /// Held trips and itineraries are upserted by id, ids deleted in the
    /// session are removed, and everything else in the store is kept. Stored
    /// itineraries left without a trip are dropped.
    pub async fn persist(&self, storage: &StorageService) -> Result<(), AppError> {
        let snapshot = self.snapshot();
        let removed = self.removed_ids().clone();

        let _guard = storage.write_lock().await;
        let stored_trips = storage.load_trips().await?;
        let stored_itineraries = storage.load_itineraries().await?;
        let (trips, itineraries) =
            merge_into_flat(&snapshot, &removed, stored_trips, stored_itineraries);
        storage.save_trips(&trips).await?;
        storage.save_itineraries(&itineraries).await?;

        {
            let mut pending = self.removed_ids();
            pending.trips.retain(|id| !removed.trips.contains(id));
            pending.itineraries.retain(|id| !removed.itineraries.contains(id));
        }
        debug!(
            "persisted {} trips and {} itineraries",
            trips.len(),
            itineraries.len()
        );
        Ok(())
    }

    pub fn snapshot(&self) -> TripsSnapshot {
        self.trips.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TripsSnapshot> {
        self.trips.subscribe()
    }

    pub fn add_trip(&self, draft: TripDraft) -> Result<Trip, AppError> {
        draft.check_date_order().map_err(AppError::Validation)?;
        let mut trip = Trip::new(draft.title, draft.start_date, draft.end_date);
        trip.description = draft.description;
        trip.destination = draft.destination;

        let added = trip.clone();
        self.replace_with(|current| {
            let mut next = current.to_vec();
            next.push(TripAggregate::new(trip));
            Some((next, ()))
        });
        Ok(added)
    }

    /// Merges `patch` into trip `id`. `Ok(None)` when the id is unknown; a
    /// patch that would end the trip before it starts is rejected.
    pub fn update_trip(&self, id: &str, patch: TripPatch) -> Result<Option<Trip>, AppError> {
        let mut rejected = None;
        let updated = self.replace_with(|current| {
            let index = current.iter().position(|agg| agg.trip.id == id)?;
            let mut trip = current[index].trip.clone();
            patch.apply(&mut trip);
            if let Err(errors) = check_date_order(trip.start_date, trip.end_date) {
                rejected = Some(errors);
                return None;
            }
            let mut next = current.to_vec();
            next[index].trip = trip.clone();
            Some((next, trip))
        });
        match rejected {
            Some(errors) => Err(AppError::Validation(errors)),
            None => Ok(updated),
        }
    }

    /// Removes trip `id` together with the itineraries it embeds.
    pub fn delete_trip(&self, id: &str) -> bool {
        let deleted = self
            .replace_with(|current| {
                if !current.iter().any(|agg| agg.trip.id == id) {
                    return None;
                }
                let next = current
                    .iter()
                    .filter(|agg| agg.trip.id != id)
                    .cloned()
                    .collect();
                Some((next, ()))
            })
            .is_some();
        if deleted {
            self.removed_ids().trips.insert(id.to_string());
        }
        deleted
    }

    /// Appends a new itinerary to trip `trip_id`; `None` when the trip is unknown.
    pub fn add_itinerary(&self, trip_id: &str, draft: ItineraryDraft) -> Option<Itinerary> {
        self.replace_with(|current| {
            let index = current.iter().position(|agg| agg.trip.id == trip_id)?;

            let mut itinerary =
                Itinerary::new(trip_id, draft.title, draft.start_date, draft.end_date);
            itinerary.description = draft.description;
            itinerary.start_time = draft.start_time;
            itinerary.end_time = draft.end_time;
            itinerary.poi = draft.poi.and_then(|poi| poi.into_poi(None));

            let mut next = current.to_vec();
            next[index].itineraries.push(itinerary.clone());
            next[index].trip.touch();
            Some((next, itinerary))
        })
    }

    /// Updates the first itinerary with `id` in any trip and re-stamps only
    /// the trip that owns it. `Ok(None)` when the id is unknown; a patch that
    /// leaves the itinerary failing the form rules is rejected and changes
    /// nothing.
    pub fn update_itinerary(
        &self,
        id: &str,
        patch: ItineraryPatch,
    ) -> Result<Option<Itinerary>, AppError> {
        let mut rejected = None;
        let updated = self.replace_with(|current| {
            let (trip_index, it_index) = locate(current, id)?;
            let mut itinerary = current[trip_index].itineraries[it_index].clone();
            patch.apply(&mut itinerary);
            if let Err(errors) = validate_itinerary_record(&itinerary).into_result() {
                rejected = Some(errors);
                return None;
            }
            let mut next = current.to_vec();
            let owner = &mut next[trip_index];
            owner.trip.updated_at = itinerary.updated_at;
            owner.itineraries[it_index] = itinerary.clone();
            Some((next, itinerary))
        });
        match rejected {
            Some(errors) => Err(AppError::Validation(errors)),
            None => Ok(updated),
        }
    }

    pub fn delete_itinerary(&self, id: &str) -> bool {
        let deleted = self
            .replace_with(|current| {
                let (trip_index, it_index) = locate(current, id)?;
                let mut next = current.to_vec();
                let owner = &mut next[trip_index];
                owner.itineraries.remove(it_index);
                owner.trip.updated_at = Utc::now();
                Some((next, ()))
            })
            .is_some();
        if deleted {
            self.removed_ids().itineraries.insert(id.to_string());
        }
        deleted
    }

    pub fn trip_by_id(&self, id: &str) -> Option<TripAggregate> {
        self.trips
            .borrow()
            .iter()
            .find(|agg| agg.trip.id == id)
            .cloned()
    }

    /// Itineraries embedded in trip `trip_id`, empty when the trip is unknown.
    pub fn itineraries_by_trip_id(&self, trip_id: &str) -> Vec<Itinerary> {
        self.trips
            .borrow()
            .iter()
            .find(|agg| agg.trip.id == trip_id)
            .map(|agg| agg.itineraries.clone())
            .unwrap_or_default()
    }

    /// Runs `build` against the current snapshot. When it returns a new
    /// collection, that collection replaces the snapshot and subscribers are
    /// notified; when it returns `None`, nothing changes.
    fn replace_with<R>(
        &self,
        build: impl FnOnce(&[TripAggregate]) -> Option<(Vec<TripAggregate>, R)>,
    ) -> Option<R> {
        let mut outcome = None;
        self.trips.send_if_modified(|current| match build(&**current) {
            Some((next, result)) => {
                *current = TripsSnapshot::from(next);
                outcome = Some(result);
                true
            }
            None => false,
        });
        outcome
    }

    fn removed_ids(&self) -> MutexGuard<'_, RemovedIds> {
        self.removed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn merge_into_flat(
    snapshot: &[TripAggregate],
    removed: &RemovedIds,
    stored_trips: Vec<Trip>,
    stored_itineraries: Vec<Itinerary>,
) -> (Vec<Trip>, Vec<Itinerary>) {
    let mut trips: Vec<Trip> = stored_trips
        .into_iter()
        .filter(|trip| !removed.trips.contains(&trip.id))
        .collect();
    for agg in snapshot {
        upsert(&mut trips, agg.trip.clone(), |trip| trip.id.as_str());
    }

    let trip_ids: HashSet<&str> = trips.iter().map(|trip| trip.id.as_str()).collect();
    let mut itineraries: Vec<Itinerary> = stored_itineraries
        .into_iter()
        .filter(|it| {
            !removed.itineraries.contains(&it.id) && trip_ids.contains(it.trip_id.as_str())
        })
        .collect();
    for it in snapshot.iter().flat_map(|agg| agg.itineraries.iter()) {
        upsert(&mut itineraries, it.clone(), |it| it.id.as_str());
    }

    (trips, itineraries)
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &str) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

fn locate(trips: &[TripAggregate], itinerary_id: &str) -> Option<(usize, usize)> {
    trips.iter().enumerate().find_map(|(t, agg)| {
        agg.itineraries
            .iter()
            .position(|it| it.id == itinerary_id)
            .map(|i| (t, i))
    })
}
