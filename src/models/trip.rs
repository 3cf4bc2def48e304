use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use super::itinerary::Itinerary;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub destination: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(title: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            destination: None,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn destination_text(&self) -> &str {
        self.destination.as_deref().unwrap_or("")
    }

    /// Number of calendar days covered, both ends inclusive.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// A trip together with the itineraries it owns, as held by the in-session
/// state container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripAggregate {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

impl TripAggregate {
    pub fn new(trip: Trip) -> Self {
        Self {
            trip,
            itineraries: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.trip.id
    }

    pub fn contains_itinerary(&self, itinerary_id: &str) -> bool {
        self.itineraries.iter().any(|it| it.id == itinerary_id)
    }
}

/// Partial trip update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripPatch {
    pub fn apply(self, trip: &mut Trip) {
        if let Some(title) = self.title {
            trip.title = title;
        }
        if let Some(description) = self.description {
            trip.description = description;
        }
        if let Some(destination) = self.destination {
            trip.destination = (!destination.trim().is_empty()).then_some(destination);
        }
        if let Some(start_date) = self.start_date {
            trip.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            trip.end_date = end_date;
        }
        trip.touch();
    }
}
