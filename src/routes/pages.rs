use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trips_list))
        .route("/trips/:id", get(trip_detail))
}

#[derive(Clone)]
struct TripRow {
    id: String,
    title: String,
    destination: String,
    dates: String,
    days: i64,
}

#[derive(Template)]
#[template(path = "trips_list.html")]
struct TripsListTemplate {
    trips: Vec<TripRow>,
}

async fn trips_list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut trips = state.trips.list().await?;
    trips.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    let rows = trips
        .into_iter()
        .map(|trip| TripRow {
            dates: format_range(trip.start_date, trip.end_date),
            days: trip.duration_days(),
            destination: trip.destination_text().to_string(),
            id: trip.id,
            title: trip.title,
        })
        .collect();
    Ok(AskamaTemplateResponse::into_response(TripsListTemplate {
        trips: rows,
    }))
}

#[derive(Clone)]
struct ItineraryRow {
    title: String,
    description: String,
    dates: String,
    times: String,
    place: String,
}

#[derive(Template)]
#[template(path = "trip_detail.html")]
struct TripDetailTemplate {
    title: String,
    description: String,
    destination: String,
    dates: String,
    itineraries: Vec<ItineraryRow>,
}

async fn trip_detail(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let trip = state
        .trips
        .read(&trip_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let itineraries = state
        .itineraries
        .list_sorted_by_trip(&trip_id)
        .await?
        .into_iter()
        .map(|it| ItineraryRow {
            dates: format_range(it.start_date, it.end_date),
            times: it.time_range_text(),
            place: it
                .poi
                .as_ref()
                .map(|poi| match poi.address_text() {
                    "" => poi.name.clone(),
                    address if poi.name.is_empty() => address.to_string(),
                    address => format!("{} ({address})", poi.name),
                })
                .unwrap_or_default(),
            title: it.title,
            description: it.description,
        })
        .collect();

    Ok(AskamaTemplateResponse::into_response(TripDetailTemplate {
        dates: format_range(trip.start_date, trip.end_date),
        destination: trip.destination_text().to_string(),
        title: trip.title,
        description: trip.description,
        itineraries,
    }))
}

fn format_range(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format("%d %b %Y").to_string()
    } else {
        format!("{} – {}", start.format("%d %b"), end.format("%d %b %Y"))
    }
}
