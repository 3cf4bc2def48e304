pub mod dates;
pub mod form;
pub mod itinerary;
pub mod poi;
pub mod trip;

pub use form::{ItineraryForm, PoiForm, TripForm};
pub use itinerary::{Itinerary, ItineraryPatch};
pub use poi::Poi;
pub use trip::{Trip, TripAggregate, TripPatch};
