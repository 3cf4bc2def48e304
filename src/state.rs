use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::{
    config::{AppConfig, StorageBackend},
    db::init_pool,
    error::AppError,
    services::{
        itinerary::ItineraryService,
        kv::{FileStore, KeyValueStore, MemoryStore, SqliteStore},
        poi_board::PoiBoard,
        storage::StorageService,
        travel::TravelState,
        trip::TripService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageService,
    pub trips: TripService,
    pub itineraries: ItineraryService,
    /// Scratch planner for the current session; see [`TravelState`].
    pub planner: TravelState,
    pub poi_board: Arc<Mutex<PoiBoard>>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService) -> Self {
        Self {
            config,
            trips: TripService::new(storage.clone()),
            itineraries: ItineraryService::new(storage.clone()),
            planner: TravelState::new(),
            poi_board: Arc::new(Mutex::new(PoiBoard::new())),
            storage,
        }
    }
}

/// Opens the key-value store selected by `config.storage_backend`.
pub async fn open_storage(config: &AppConfig) -> Result<StorageService, AppError> {
    let store: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => {
            let store = FileStore::new(config.data_root.clone());
            store.ensure_structure().await?;
            Arc::new(store)
        }
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(init_pool(&config.database_url).await?)),
    };
    info!("using {:?} storage backend", config.storage_backend);
    Ok(StorageService::new(store))
}
