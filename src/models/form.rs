//! Fixed-shape records for what the trip and itinerary forms submit.
//!
//! Fields hold the raw strings a user typed; [`crate::validation`] judges them
//! and the `to_draft` conversions turn them into typed values.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::poi::Poi;
use crate::validation::{check_date, check_date_order, check_time, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItineraryForm {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub poi: Option<PoiForm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoiForm {
    pub id: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripForm {
    pub title: String,
    pub description: String,
    pub destination: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

/// Typed itinerary fields ready to be stamped into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDraft {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub poi: Option<PoiForm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripDraft {
    pub title: String,
    pub description: String,
    pub destination: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ItineraryForm {
    /// Structural conversion only: dates must parse and non-blank times must
    /// be `HH:MM`. Content rules are left to [`crate::validation`].
    pub fn to_draft(&self) -> Result<ItineraryDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let start_date = check_date(&mut errors, "startDate", "Start date", &self.start_date);
        let end_date = check_date(&mut errors, "endDate", "End date", &self.end_date);
        let start_time = check_time(&mut errors, "startTime", "Start time", self.start_time.as_deref());
        let end_time = check_time(&mut errors, "endTime", "End time", self.end_time.as_deref());

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) if errors.is_empty() => {
                Ok(ItineraryDraft {
                    title: self.title.clone(),
                    description: self.description.clone(),
                    start_date,
                    end_date,
                    start_time,
                    end_time,
                    poi: self.poi.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

impl TripForm {
    pub fn to_draft(&self) -> Result<TripDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let start_date = check_date(&mut errors, "startDate", "Start date", &self.start_date);
        let end_date = check_date(&mut errors, "endDate", "End date", &self.end_date);

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) => Ok(TripDraft {
                title: self.title.clone(),
                description: self.description.clone(),
                destination: non_blank(self.destination.as_deref()).map(str::to_string),
                start_date,
                end_date,
            }),
            _ => Err(errors),
        }
    }
}

impl TripDraft {
    /// A trip may not end before it starts.
    pub fn check_date_order(&self) -> Result<(), ValidationErrors> {
        check_date_order(self.start_date, self.end_date)
    }
}

impl PoiForm {
    /// Whether the form carries enough to be worth storing as a POI record.
    pub fn has_content(&self) -> bool {
        non_blank(self.name.as_deref()).is_some()
            || non_blank(self.address.as_deref()).is_some()
            || non_blank(self.description.as_deref()).is_some()
    }

    /// Builds the POI record, keeping the submitted id, then `existing_id`,
    /// and only minting a fresh one when neither is present.
    pub fn into_poi(self, existing_id: Option<&str>) -> Option<Poi> {
        if !self.has_content() {
            return None;
        }
        let id = non_blank(self.id.as_deref())
            .or(existing_id)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Some(Poi {
            id,
            name: self.name.unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            description: self.description,
            confirmed: None,
        })
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poi_is_built_only_when_it_has_content() {
        let coords_only = PoiForm {
            latitude: Some(48.86),
            longitude: Some(2.33),
            ..PoiForm::default()
        };
        assert!(coords_only.into_poi(None).is_none());

        let named = PoiForm {
            name: Some("Louvre".into()),
            ..PoiForm::default()
        };
        let poi = named.into_poi(Some("poi-1")).expect("poi");
        assert_eq!(poi.id, "poi-1");
        assert_eq!(poi.name, "Louvre");
    }

    #[test]
    fn address_only_poi_gets_empty_name_and_fresh_id() {
        let form = PoiForm {
            address: Some("Rue de Rivoli".into()),
            ..PoiForm::default()
        };
        let poi = form.into_poi(None).expect("poi");
        assert_eq!(poi.name, "");
        assert!(!poi.id.is_empty());
    }

    #[test]
    fn draft_rejects_malformed_time() {
        let form = ItineraryForm {
            title: "Walk".into(),
            description: "City".into(),
            start_date: "2024-06-04".into(),
            end_date: "2024-06-04".into(),
            start_time: Some("9am".into()),
            ..ItineraryForm::default()
        };
        let errors = form.to_draft().expect_err("bad time");
        assert_eq!(errors.fields(), ["startTime"]);
    }

    #[test]
    fn blank_times_are_treated_as_absent() {
        let form = ItineraryForm {
            title: "Walk".into(),
            description: "City".into(),
            start_date: "2024-06-04".into(),
            end_date: "2024-06-04".into(),
            start_time: Some("  ".into()),
            end_time: Some(String::new()),
            ..ItineraryForm::default()
        };
        let draft = form.to_draft().expect("draft");
        assert_eq!(draft.start_time, None);
        assert_eq!(draft.end_time, None);
    }
}
