use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::AppError,
    models::{Itinerary, ItineraryForm, Trip, TripForm},
    state::AppState,
    validation::{validate_itinerary, validate_trip, ValidationErrors},
};

use super::session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route(
            "/trips/:id/itineraries",
            get(list_itineraries).post(create_itinerary),
        )
        .route("/itineraries/validate", post(validate_itinerary_form))
        .route(
            "/itineraries/:id",
            get(get_itinerary)
                .put(update_itinerary)
                .delete(delete_itinerary),
        )
        .merge(session::router())
}

async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(state.trips.list().await?))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(form): Json<TripForm>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    validate_trip(&form).into_result().map_err(AppError::Validation)?;
    let trip = state.trips.create(&form).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    let trip = state.trips.read(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(trip))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<TripForm>,
) -> Result<Json<Trip>, AppError> {
    validate_trip(&form).into_result().map_err(AppError::Validation)?;
    let trip = state
        .trips
        .update(&id, &form)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.trips.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn list_itineraries(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<Itinerary>>, AppError> {
    state.trips.read(&trip_id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(state.itineraries.list_sorted_by_trip(&trip_id).await?))
}

async fn create_itinerary(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(form): Json<ItineraryForm>,
) -> Result<(StatusCode, Json<Itinerary>), AppError> {
    validate_itinerary(&form)
        .into_result()
        .map_err(AppError::Validation)?;
    let itinerary = state.itineraries.create(&trip_id, &form).await?;
    Ok((StatusCode::CREATED, Json(itinerary)))
}

async fn validate_itinerary_form(Json(form): Json<ItineraryForm>) -> Json<ValidationErrors> {
    Json(validate_itinerary(&form))
}

async fn get_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Itinerary>, AppError> {
    let itinerary = state
        .itineraries
        .read(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(itinerary))
}

async fn update_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<ItineraryForm>,
) -> Result<Json<Itinerary>, AppError> {
    validate_itinerary(&form)
        .into_result()
        .map_err(AppError::Validation)?;
    let itinerary = state
        .itineraries
        .update(&id, &form)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(itinerary))
}

async fn delete_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.itineraries.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
