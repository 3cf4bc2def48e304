pub mod itinerary;
pub mod kv;
pub mod poi_board;
pub mod storage;
pub mod travel;
pub mod trip;
