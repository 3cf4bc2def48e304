//! Field-level checks for the itinerary and trip forms.
//!
//! Every rule runs; nothing short-circuits. The resulting list keeps the order
//! the rules are declared in so the same input always yields the same errors.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::{
    dates::{minutes_since_midnight, parse_date, parse_time},
    form::{non_blank, ItineraryForm, TripForm},
    Itinerary,
};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const DESTINATION_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Message of the first error reported for `field`.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when empty, otherwise the errors themselves.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The `endDate` error both forms report when a range ends before it starts.
fn date_order_error() -> ValidationError {
    ValidationError::new("endDate", "End date must be after start date")
}

pub fn check_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationErrors> {
    if start > end {
        return Err([date_order_error()].into_iter().collect());
    }
    Ok(())
}

pub fn has_validation_errors(errors: &ValidationErrors) -> bool {
    !errors.is_empty()
}

pub fn validate_itinerary(form: &ItineraryForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    check_text(&mut errors, "title", "Title", &form.title, TITLE_MAX_CHARS, true);
    check_text(
        &mut errors,
        "description",
        "Description",
        &form.description,
        DESCRIPTION_MAX_CHARS,
        true,
    );

    let start_date = check_date(&mut errors, "startDate", "Start date", &form.start_date);
    let end_date = check_date(&mut errors, "endDate", "End date", &form.end_date);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            errors.push(date_order_error());
        }
    }

    let start_time = check_time(&mut errors, "startTime", "Start time", form.start_time.as_deref());
    let end_time = check_time(&mut errors, "endTime", "End time", form.end_time.as_deref());
    let same_day = matches!((start_date, end_date), (Some(s), Some(e)) if s == e);
    check_time_order(&mut errors, same_day, start_time, end_time);

    errors
}

/// Re-checks an itinerary that was edited in place, e.g. by a partial patch.
/// Dates and times are already typed, so only content and ordering rules apply.
pub fn validate_itinerary_record(itinerary: &Itinerary) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    check_text(&mut errors, "title", "Title", &itinerary.title, TITLE_MAX_CHARS, true);
    check_text(
        &mut errors,
        "description",
        "Description",
        &itinerary.description,
        DESCRIPTION_MAX_CHARS,
        true,
    );
    if itinerary.start_date > itinerary.end_date {
        errors.push(date_order_error());
    }
    check_time_order(
        &mut errors,
        itinerary.start_date == itinerary.end_date,
        itinerary.start_time,
        itinerary.end_time,
    );

    errors
}

fn check_time_order(
    errors: &mut ValidationErrors,
    same_day: bool,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) {
    if let (Some(start), Some(end), true) = (start, end, same_day) {
        if minutes_since_midnight(start) >= minutes_since_midnight(end) {
            errors.push(ValidationError::new(
                "endTime",
                "End time must be after start time on the same day",
            ));
        }
    }
}

/// Trip form rules. Unlike itineraries, a trip's description may be left empty.
pub fn validate_trip(form: &TripForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    check_text(&mut errors, "title", "Title", &form.title, TITLE_MAX_CHARS, true);
    check_text(
        &mut errors,
        "description",
        "Description",
        &form.description,
        DESCRIPTION_MAX_CHARS,
        false,
    );
    if let Some(destination) = form.destination.as_deref() {
        check_text(
            &mut errors,
            "destination",
            "Destination",
            destination,
            DESTINATION_MAX_CHARS,
            false,
        );
    }

    let start_date = check_date(&mut errors, "startDate", "Start date", &form.start_date);
    let end_date = check_date(&mut errors, "endDate", "End date", &form.end_date);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            errors.push(date_order_error());
        }
    }

    errors
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    max_chars: usize,
    required: bool,
) {
    if required && value.trim().is_empty() {
        errors.push(ValidationError::new(field, format!("{label} is required")));
    }
    if value.chars().count() > max_chars {
        errors.push(ValidationError::new(
            field,
            format!("{label} must be {max_chars} characters or less"),
        ));
    }
}

pub(crate) fn check_date(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    raw: &str,
) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        errors.push(ValidationError::new(field, format!("{label} is required")));
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.push(ValidationError::new(
            field,
            format!("{label} must be a valid date (YYYY-MM-DD)"),
        ));
    }
    parsed
}

pub(crate) fn check_time(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    raw: Option<&str>,
) -> Option<NaiveTime> {
    let raw = non_blank(raw)?;
    let parsed = parse_time(raw);
    if parsed.is_none() {
        errors.push(ValidationError::new(
            field,
            format!("{label} must be a valid time (HH:MM)"),
        ));
    }
    parsed
}
