//! Swipe interaction and deck state engine.
//! This crate is the single source of truth for deck and preference invariants.

pub mod catalog;
pub mod config;
pub mod db;
pub mod deck;
pub mod fling;
pub mod gesture;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use catalog::{Catalog, CatalogCache};
pub use config::{ConfigError, EngineConfig};
pub use deck::{CardRole, DeckStack, Glyph, GlyphKind, RenderFrame, VisibleCard};
pub use fling::{FlingCoordinator, FlingTiming, PendingFling};
pub use gesture::{
    CardVisual, DetachedSurface, GestureOutcome, GesturePhase, InputSurface, PointerId,
    RecordingSurface, ReleaseKind, Viewport,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::{CardId, CardItem};
pub use model::swipe::{SwipeAction, SwipeDirection};
pub use repo::kv_repo::{
    InMemoryKeyValueRepository, KeyValueRepository, RepoError, RepoResult,
    SqliteKeyValueRepository,
};
pub use service::swipe_session::{
    DeckChange, KeyInput, SwipeResolution, SwipeSession, SyncReport,
};
pub use store::likes::LikesStore;
pub use store::persisted_set::{ChangeSource, IdSet, ObserverId, PersistedSet};
pub use store::seen::SeenTracker;
pub use sync::storage_bus::{new_context_id, ContextId, StorageBus, StorageEvent, StorageEventKind};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
