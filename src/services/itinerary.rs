use tracing::{debug, info};

use crate::{
    error::AppError,
    models::{itinerary::sort_by_schedule, Itinerary, ItineraryForm},
};

use super::storage::StorageService;

/// Itinerary CRUD over the flat itinerary collection. Each itinerary points
/// at its trip through `trip_id`.
///
/// Content rules from [`crate::validation::validate_itinerary`] are the
/// caller's job; this service only checks that dates and times parse and that
/// the parent trip exists.
#[derive(Clone)]
pub struct ItineraryService {
    storage: StorageService,
}

impl ItineraryService {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }

    pub async fn create(&self, trip_id: &str, form: &ItineraryForm) -> Result<Itinerary, AppError> {
        let draft = form.to_draft().map_err(AppError::Validation)?;

        let _guard = self.storage.write_lock().await;
        if self.storage.trip_by_id(trip_id).await?.is_none() {
            debug!("refusing itinerary for unknown trip {trip_id}");
            return Err(AppError::NotFound);
        }

        let mut itinerary = Itinerary::new(trip_id, draft.title, draft.start_date, draft.end_date);
        itinerary.description = draft.description;
        itinerary.start_time = draft.start_time;
        itinerary.end_time = draft.end_time;
        itinerary.poi = draft.poi.and_then(|poi| poi.into_poi(None));

        let mut itineraries = self.storage.load_itineraries().await?;
        itineraries.push(itinerary.clone());
        self.storage.save_itineraries(&itineraries).await?;
        info!("created itinerary {} for trip {trip_id}", itinerary.id);
        Ok(itinerary)
    }

    pub async fn read(&self, id: &str) -> Result<Option<Itinerary>, AppError> {
        self.storage.itinerary_by_id(id).await
    }

    /// Replaces the editable fields of itinerary `id`. `Ok(None)` means no
    /// itinerary has that id and nothing was written.
    pub async fn update(
        &self,
        id: &str,
        form: &ItineraryForm,
    ) -> Result<Option<Itinerary>, AppError> {
        let draft = form.to_draft().map_err(AppError::Validation)?;

        let _guard = self.storage.write_lock().await;
        let mut itineraries = self.storage.load_itineraries().await?;
        let Some(existing) = itineraries.iter_mut().find(|it| it.id == id) else {
            return Ok(None);
        };

        let previous_poi = existing.poi.take();
        existing.title = draft.title;
        existing.description = draft.description;
        existing.start_date = draft.start_date;
        existing.end_date = draft.end_date;
        existing.start_time = draft.start_time;
        existing.end_time = draft.end_time;
        existing.poi = draft.poi.and_then(|form| {
            let mut poi = form.into_poi(previous_poi.as_ref().map(|p| p.id.as_str()))?;
            if let Some(previous) = previous_poi.as_ref().filter(|p| p.id == poi.id) {
                poi.confirmed = previous.confirmed;
            }
            Some(poi)
        });
        existing.touch();

        let updated = existing.clone();
        self.storage.save_itineraries(&itineraries).await?;
        info!("updated itinerary {id}");
        Ok(Some(updated))
    }

    /// Returns `false` when no itinerary has that id.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.storage.write_lock().await;
        let mut itineraries = self.storage.load_itineraries().await?;
        let before = itineraries.len();
        itineraries.retain(|it| it.id != id);
        if itineraries.len() == before {
            return Ok(false);
        }
        self.storage.save_itineraries(&itineraries).await?;
        info!("deleted itinerary {id}");
        Ok(true)
    }

    pub async fn list_for_trip(&self, trip_id: &str) -> Result<Vec<Itinerary>, AppError> {
        self.storage.itineraries_by_trip_id(trip_id).await
    }

    /// Itineraries of a trip ordered by start date, then start time (midnight
    /// when unset). Equal keys keep their stored order.
    pub async fn list_sorted_by_trip(&self, trip_id: &str) -> Result<Vec<Itinerary>, AppError> {
        let mut itineraries = self.list_for_trip(trip_id).await?;
        sort_by_schedule(&mut itineraries);
        Ok(itineraries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::models::{PoiForm, Trip};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    async fn service_with_trip(trip_id: &str) -> ItineraryService {
        let storage = StorageService::in_memory();
        let mut trip = Trip::new("Paris", day(1), day(10));
        trip.id = trip_id.to_string();
        storage.save_trips(&[trip]).await.expect("save trip");
        ItineraryService::new(storage)
    }

    fn louvre() -> ItineraryForm {
        ItineraryForm {
            title: "Louvre Visit".into(),
            description: "Museum day".into(),
            start_date: "2024-06-02".into(),
            end_date: "2024-06-02".into(),
            start_time: Some("09:00".into()),
            end_time: Some("12:00".into()),
            poi: None,
        }
    }

    fn at(date: &str, time: Option<&str>, title: &str) -> ItineraryForm {
        ItineraryForm {
            title: title.into(),
            description: "d".into(),
            start_date: date.into(),
            end_date: date.into(),
            start_time: time.map(str::to_string),
            ..ItineraryForm::default()
        }
    }

    #[tokio::test]
    async fn create_then_read_returns_the_record() {
        let service = service_with_trip("trip-1").await;
        let created = service.create("trip-1", &louvre()).await.expect("create");
        assert_eq!(created.trip_id, "trip-1");
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.start_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert!(created.poi.is_none());

        let read = service.read(&created.id).await.expect("read");
        assert_eq!(read, Some(created));
    }

    #[tokio::test]
    async fn create_requires_an_existing_trip() {
        let service = service_with_trip("trip-1").await;
        let err = service.create("trip-x", &louvre()).await.expect_err("orphan");
        assert!(matches!(err, AppError::NotFound));
        assert!(service.list_for_trip("trip-x").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unparseable_dates() {
        let service = service_with_trip("trip-1").await;
        let mut form = louvre();
        form.start_date = "June 2nd".into();
        let err = service.create("trip-1", &form).await.expect_err("bad date");
        match err {
            AppError::Validation(errors) => assert_eq!(errors.fields(), ["startDate"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_of_missing_id_changes_nothing() {
        let service = service_with_trip("trip-1").await;
        service.create("trip-1", &louvre()).await.expect("create");
        let before = service.list_for_trip("trip-1").await.expect("list");

        let updated = service.update("missing-id", &louvre()).await.expect("update");
        assert!(updated.is_none());
        assert_eq!(service.list_for_trip("trip-1").await.expect("list"), before);
    }

    #[tokio::test]
    async fn update_keeps_the_poi_id() {
        let service = service_with_trip("trip-1").await;
        let mut form = louvre();
        form.poi = Some(PoiForm {
            name: Some("Louvre".into()),
            ..PoiForm::default()
        });
        let created = service.create("trip-1", &form).await.expect("create");
        let poi_id = created.poi.as_ref().map(|p| p.id.clone()).expect("poi");

        form.title = "Louvre, again".into();
        form.poi = Some(PoiForm {
            name: Some("Musée du Louvre".into()),
            ..PoiForm::default()
        });
        let updated = service
            .update(&created.id, &form)
            .await
            .expect("update")
            .expect("found");
        assert_eq!(updated.title, "Louvre, again");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        let poi = updated.poi.expect("poi kept");
        assert_eq!(poi.id, poi_id);
        assert_eq!(poi.name, "Musée du Louvre");
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let service = service_with_trip("trip-1").await;
        let created = service.create("trip-1", &louvre()).await.expect("create");
        assert!(service.delete(&created.id).await.expect("delete"));
        assert_eq!(service.read(&created.id).await.expect("read"), None);
        assert!(!service.delete(&created.id).await.expect("delete again"));
    }

    #[tokio::test]
    async fn sorted_listing_orders_by_date_then_time() {
        let service = service_with_trip("trip-1").await;
        for form in [
            at("2024-06-03", Some("08:00"), "d3 morning"),
            at("2024-06-02", Some("14:00"), "d2 afternoon"),
            at("2024-06-02", None, "d2 untimed"),
            at("2024-06-02", Some("00:00"), "d2 midnight"),
            at("2024-06-01", Some("23:59"), "d1 late"),
        ] {
            service.create("trip-1", &form).await.expect("create");
        }

        let titles: Vec<String> = service
            .list_sorted_by_trip("trip-1")
            .await
            .expect("list")
            .into_iter()
            .map(|it| it.title)
            .collect();
        assert_eq!(
            titles,
            ["d1 late", "d2 untimed", "d2 midnight", "d2 afternoon", "d3 morning"]
        );
    }
}
