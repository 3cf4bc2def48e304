//! Endpoints over the in-session planner and the map POI board.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{
        Itinerary, ItineraryForm, ItineraryPatch, Poi, Trip, TripAggregate, TripForm, TripPatch,
    },
    state::AppState,
    validation::{validate_itinerary, validate_trip},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session/trips", get(list_trips).post(add_trip))
        .route(
            "/session/trips/:id",
            patch(update_trip).delete(delete_trip),
        )
        .route("/session/trips/:id/itineraries", post(add_itinerary))
        .route(
            "/session/itineraries/:id",
            patch(update_itinerary).delete(delete_itinerary),
        )
        .route("/session/persist", post(persist))
        .route("/session/pois", get(list_pois))
        .route("/session/pois/pick", post(pick_location))
        .route("/session/pois/search", post(add_search_result))
        .route("/session/pois/:id/confirm", post(confirm_poi))
        .route("/session/pois/:id", delete(remove_poi))
}

async fn list_trips(State(state): State<AppState>) -> Json<Vec<TripAggregate>> {
    Json(state.planner.snapshot().to_vec())
}

async fn add_trip(
    State(state): State<AppState>,
    Json(form): Json<TripForm>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    validate_trip(&form).into_result().map_err(AppError::Validation)?;
    let draft = form.to_draft().map_err(AppError::Validation)?;
    let trip = state.planner.add_trip(draft)?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .planner
        .update_trip(&id, changes)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(trip))
}

async fn delete_trip(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    status_for(state.planner.delete_trip(&id))
}

async fn add_itinerary(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(form): Json<ItineraryForm>,
) -> Result<(StatusCode, Json<Itinerary>), AppError> {
    validate_itinerary(&form)
        .into_result()
        .map_err(AppError::Validation)?;
    let draft = form.to_draft().map_err(AppError::Validation)?;
    let itinerary = state
        .planner
        .add_itinerary(&trip_id, draft)
        .ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(itinerary)))
}

async fn update_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<ItineraryPatch>,
) -> Result<Json<Itinerary>, AppError> {
    let itinerary = state
        .planner
        .update_itinerary(&id, changes)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(itinerary))
}

async fn delete_itinerary(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    status_for(state.planner.delete_itinerary(&id))
}

async fn persist(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.planner.persist(&state.storage).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_pois(State(state): State<AppState>) -> Json<Vec<Poi>> {
    Json(state.poi_board.lock().await.pois().to_vec())
}

#[derive(Deserialize)]
struct PickForm {
    longitude: f64,
    latitude: f64,
}

async fn pick_location(
    State(state): State<AppState>,
    Json(form): Json<PickForm>,
) -> (StatusCode, Json<Poi>) {
    let poi = state
        .poi_board
        .lock()
        .await
        .pick_location(form.longitude, form.latitude);
    (StatusCode::CREATED, Json(poi))
}

#[derive(Deserialize)]
struct SearchResultForm {
    name: String,
    longitude: f64,
    latitude: f64,
    address: String,
}

async fn add_search_result(
    State(state): State<AppState>,
    Json(form): Json<SearchResultForm>,
) -> (StatusCode, Json<Poi>) {
    let poi = state.poi_board.lock().await.add_search_result(
        form.name,
        form.longitude,
        form.latitude,
        form.address,
    );
    (StatusCode::CREATED, Json(poi))
}

async fn confirm_poi(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    status_for(state.poi_board.lock().await.confirm(&id))
}

async fn remove_poi(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    status_for(state.poi_board.lock().await.remove(&id))
}

fn status_for(found: bool) -> StatusCode {
    if found {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
