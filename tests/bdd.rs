use std::fmt;

use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use wanderlust::{
    error::AppError,
    models::{Itinerary, ItineraryForm, Trip, TripForm},
    services::{
        itinerary::ItineraryService, storage::StorageService, travel::TravelState,
        trip::TripService,
    },
    validation::{validate_itinerary, ValidationErrors},
};

#[derive(Debug, cucumber::World, Default)]
struct TravelWorld {
    services: Option<TestServices>,
    planner: Option<TestPlanner>,
    last_itinerary: Option<Itinerary>,
    last_trip_id: Option<String>,
    not_found: bool,
    form: Option<ItineraryForm>,
    errors: Option<ValidationErrors>,
}

impl TravelWorld {
    fn services(&self) -> &TestServices {
        self.services
            .as_ref()
            .expect("store must be initialised first")
    }

    fn planner(&self) -> &TravelState {
        &self
            .planner
            .as_ref()
            .expect("planner must be initialised first")
            .0
    }

    fn last_itinerary(&self) -> &Itinerary {
        self.last_itinerary
            .as_ref()
            .expect("an itinerary must have been created")
    }

    fn last_trip_id(&self) -> &str {
        self.last_trip_id
            .as_deref()
            .expect("a trip must have been added")
    }
}

struct TestServices {
    trips: TripService,
    itineraries: ItineraryService,
}

impl fmt::Debug for TestServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestServices").finish()
    }
}

impl TestServices {
    async fn with_trip(trip_id: &str) -> anyhow::Result<Self> {
        let storage = StorageService::in_memory();
        let mut trip = Trip::new("Paris", date("2024-06-01"), date("2024-06-10"));
        trip.id = trip_id.to_string();
        storage.save_trips(&[trip]).await?;
        Ok(Self {
            trips: TripService::new(storage.clone()),
            itineraries: ItineraryService::new(storage),
        })
    }
}

struct TestPlanner(TravelState);

impl fmt::Debug for TestPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestPlanner")
            .field(&self.0.snapshot().len())
            .finish()
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("feature dates are ISO")
}

fn itinerary_form(title: &str, day: &str, times: Option<(&str, &str)>) -> ItineraryForm {
    ItineraryForm {
        title: title.into(),
        description: format!("{title} plans"),
        start_date: day.into(),
        end_date: day.into(),
        start_time: times.map(|(start, _)| start.to_string()),
        end_time: times.map(|(_, end)| end.to_string()),
        poi: None,
    }
}

#[given(regex = r#"^a fresh store holding a trip "([^"]+)"$"#)]
async fn given_store_with_trip(world: &mut TravelWorld, trip_id: String) {
    world.services = Some(TestServices::with_trip(&trip_id).await.expect("store"));
    world.last_itinerary = None;
    world.not_found = false;
}

#[when(
    regex = r#"^I create an itinerary "([^"]+)" on trip "([^"]+)" for "([^"]+)" from "([^"]+)" to "([^"]+)"$"#
)]
async fn when_create_itinerary(
    world: &mut TravelWorld,
    title: String,
    trip_id: String,
    day: String,
    start: String,
    end: String,
) {
    let form = itinerary_form(&title, &day, Some((start.as_str(), end.as_str())));
    let created = world
        .services()
        .itineraries
        .create(&trip_id, &form)
        .await
        .expect("create itinerary");
    world.last_itinerary = Some(created);
}

#[when(regex = r#"^I try to create an itinerary "([^"]+)" on trip "([^"]+)" for "([^"]+)"$"#)]
async fn when_try_create_itinerary(world: &mut TravelWorld, title: String, trip_id: String, day: String) {
    let form = itinerary_form(&title, &day, None);
    let outcome = world.services().itineraries.create(&trip_id, &form).await;
    world.not_found = matches!(outcome, Err(AppError::NotFound));
}

#[when(regex = r#"^I update itinerary "([^"]+)"$"#)]
async fn when_update_itinerary(world: &mut TravelWorld, id: String) {
    let form = itinerary_form("Renamed", "2024-06-02", None);
    let updated = world
        .services()
        .itineraries
        .update(&id, &form)
        .await
        .expect("update itinerary");
    world.not_found = updated.is_none();
}

#[when("I delete the last itinerary")]
async fn when_delete_last(world: &mut TravelWorld) {
    let id = world.last_itinerary().id.clone();
    let deleted = world
        .services()
        .itineraries
        .delete(&id)
        .await
        .expect("delete itinerary");
    assert!(deleted);
}

#[when(regex = r#"^I delete trip "([^"]+)"$"#)]
async fn when_delete_trip(world: &mut TravelWorld, trip_id: String) {
    let deleted = world
        .services()
        .trips
        .delete(&trip_id)
        .await
        .expect("delete trip");
    assert!(deleted);
}

#[then(regex = r#"^the last itinerary belongs to trip "([^"]+)"$"#)]
async fn then_belongs_to(world: &mut TravelWorld, trip_id: String) {
    let itinerary = world.last_itinerary();
    assert_eq!(itinerary.trip_id, trip_id);
    assert!(!itinerary.id.is_empty());
}

#[then("reading the last itinerary back returns the same record")]
async fn then_read_back(world: &mut TravelWorld) {
    let expected = world.last_itinerary().clone();
    let read = world
        .services()
        .itineraries
        .read(&expected.id)
        .await
        .expect("read itinerary");
    assert_eq!(read, Some(expected));
}

#[then("reading the last itinerary back reports not found")]
async fn then_read_missing(world: &mut TravelWorld) {
    let id = world.last_itinerary().id.clone();
    let read = world
        .services()
        .itineraries
        .read(&id)
        .await
        .expect("read itinerary");
    assert!(read.is_none());
}

#[then("the service reports not found")]
async fn then_not_found(world: &mut TravelWorld) {
    assert!(world.not_found);
}

#[then(regex = r#"^trip "([^"]+)" has (\d+) stored itineraries$"#)]
async fn then_stored_count(world: &mut TravelWorld, trip_id: String, expected: usize) {
    let items = world
        .services()
        .itineraries
        .list_for_trip(&trip_id)
        .await
        .expect("list itineraries");
    assert_eq!(items.len(), expected);
}

#[then(regex = r#"^the itineraries of trip "([^"]+)" are ordered "([^"]+)"$"#)]
async fn then_ordered(world: &mut TravelWorld, trip_id: String, expected: String) {
    let titles: Vec<String> = world
        .services()
        .itineraries
        .list_sorted_by_trip(&trip_id)
        .await
        .expect("list itineraries")
        .into_iter()
        .map(|it| it.title)
        .collect();
    let expected: Vec<String> = expected.split(", ").map(str::to_string).collect();
    assert_eq!(titles, expected);
}

#[given(regex = r#"^an itinerary form titled "([^"]*)" described "([^"]*)" from "([^"]*)" to "([^"]*)"$"#)]
async fn given_form(
    world: &mut TravelWorld,
    title: String,
    description: String,
    start: String,
    end: String,
) {
    world.form = Some(ItineraryForm {
        title,
        description,
        start_date: start,
        end_date: end,
        ..ItineraryForm::default()
    });
    world.errors = None;
}

#[given(regex = r#"^the form runs from "([^"]*)" to "([^"]*)"$"#)]
async fn given_form_times(world: &mut TravelWorld, start: String, end: String) {
    let form = world.form.as_mut().expect("form must exist");
    form.start_time = Some(start);
    form.end_time = Some(end);
}

#[when("the form is validated")]
async fn when_validated(world: &mut TravelWorld) {
    let form = world.form.as_ref().expect("form must exist");
    world.errors = Some(validate_itinerary(form));
}

#[then(regex = r#"^the errors are for "([^"]+)"$"#)]
async fn then_errors_for(world: &mut TravelWorld, fields: String) {
    let errors = world.errors.as_ref().expect("form must be validated");
    let expected: Vec<&str> = fields.split(", ").collect();
    assert_eq!(errors.fields(), expected);
}

#[then("there are no errors")]
async fn then_no_errors(world: &mut TravelWorld) {
    let errors = world.errors.as_ref().expect("form must be validated");
    assert!(errors.is_empty(), "unexpected errors: {errors}");
}

#[given("an empty travel planner")]
async fn given_empty_planner(world: &mut TravelWorld) {
    world.planner = Some(TestPlanner(TravelState::new()));
    world.last_trip_id = None;
}

#[when(regex = r#"^I add a trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn when_add_trip(world: &mut TravelWorld, title: String, start: String, end: String) {
    let form = TripForm {
        title,
        description: "A test trip".into(),
        destination: Some("Paris".into()),
        start_date: start,
        end_date: end,
    };
    let draft = form.to_draft().expect("trip dates parse");
    let trip = world.planner().add_trip(draft).expect("add trip");
    world.last_trip_id = Some(trip.id);
}

#[when(regex = r#"^I add an itinerary "([^"]+)" to that trip$"#)]
async fn when_add_planner_itinerary(world: &mut TravelWorld, title: String) {
    let trip_id = world.last_trip_id().to_string();
    let trip = world.planner().trip_by_id(&trip_id).expect("trip exists");
    let day = trip.trip.start_date.format("%Y-%m-%d").to_string();
    let draft = itinerary_form(&title, &day, None)
        .to_draft()
        .expect("itinerary dates parse");
    let added = world.planner().add_itinerary(&trip_id, draft);
    assert!(added.is_some());
}

#[when("I delete that trip")]
async fn when_delete_planner_trip(world: &mut TravelWorld) {
    let trip_id = world.last_trip_id().to_string();
    assert!(world.planner().delete_trip(&trip_id));
}

#[then(regex = r"^that trip has (\d+) itinerar(?:y|ies)$")]
async fn then_trip_itinerary_count(world: &mut TravelWorld, expected: usize) {
    let trip_id = world.last_trip_id().to_string();
    assert_eq!(world.planner().itineraries_by_trip_id(&trip_id).len(), expected);
}

#[then("every itinerary of that trip points back to it")]
async fn then_points_back(world: &mut TravelWorld) {
    let trip_id = world.last_trip_id().to_string();
    let itineraries = world.planner().itineraries_by_trip_id(&trip_id);
    assert!(itineraries.iter().all(|it| it.trip_id == trip_id));
}

#[then(regex = r"^the planner holds (\d+) trips$")]
async fn then_planner_count(world: &mut TravelWorld, expected: usize) {
    assert_eq!(world.planner().snapshot().len(), expected);
}

#[tokio::main]
async fn main() {
    TravelWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
