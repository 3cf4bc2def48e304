use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use super::{
    dates::{hhmm_opt, hhmm_patch},
    poi::Poi,
};

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: String,
    pub trip_id: String,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, with = "hhmm_opt")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm_opt")]
    pub end_time: Option<NaiveTime>,
    pub poi: Option<Poi>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Itinerary {
    pub fn new(
        trip_id: impl Into<String>,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.into(),
            title: title.into(),
            description: String::new(),
            start_date,
            end_date,
            start_time: None,
            end_time: None,
            poi: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Key itineraries are ordered by: start date, then start time with a
    /// missing time counting as midnight.
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (
            self.start_date,
            self.start_time.unwrap_or(NaiveTime::MIN),
        )
    }

    pub fn time_range_text(&self) -> String {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => format!("{} – {}", start.format("%H:%M"), end.format("%H:%M")),
            (Some(start), None) => format!("from {}", start.format("%H:%M")),
            (None, Some(end)) => format!("until {}", end.format("%H:%M")),
            (None, None) => String::new(),
        }
    }
}

/// Sorts itineraries ascending by [`Itinerary::sort_key`], keeping the input
/// order of equal keys.
pub fn sort_by_schedule(itineraries: &mut [Itinerary]) {
    itineraries.sort_by_key(Itinerary::sort_key);
}

/// Partial itinerary update used by the in-session state container.
///
/// Absent fields are left as they are. The optional fields take an extra
/// layer: `Some(None)` (sent as `null`) clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "hhmm_patch::deserialize")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "hhmm_patch::deserialize")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub poi: Option<Option<Poi>>,
}

impl ItineraryPatch {
    pub fn apply(self, itinerary: &mut Itinerary) {
        if let Some(title) = self.title {
            itinerary.title = title;
        }
        if let Some(description) = self.description {
            itinerary.description = description;
        }
        if let Some(start_date) = self.start_date {
            itinerary.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            itinerary.end_date = end_date;
        }
        if let Some(start_time) = self.start_time {
            itinerary.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            itinerary.end_time = end_time;
        }
        if let Some(poi) = self.poi {
            itinerary.poi = poi;
        }
        itinerary.touch();
    }
}
