//! Swipe deck API exported to the Flutter shell.
//!
//! # Responsibility
//! - Export deck, gesture and preference use cases as FRB sync calls.
//! - Hold the process-wide swipe session and its catalog cache.
//! - Flatten the render contract into plain transferable structs.
//!
//! # Invariants
//! - No exported function panics; failures come back as envelopes or
//!   neutral values.
//! - Every call runs under one session lock, so inputs are processed one
//!   at a time in arrival order.
//! - Times are host monotonic milliseconds; negative values clamp to zero.

use log::{info, warn};
use swipedeck_core::db::open_db;
use swipedeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, new_context_id,
    ping as ping_inner, CardItem, CardRole, CardVisual, CatalogCache, EngineConfig,
    GestureOutcome, Glyph, GlyphKind, KeyInput, RecordingSurface, ReleaseKind,
    SqliteKeyValueRepository, StorageBus, SwipeDirection, SwipeSession, Viewport,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const DECK_DB_FILE_NAME: &str = "swipedeck_prefs.sqlite3";
static DECK_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static DECK: Mutex<Option<DeckState>> = Mutex::new(None);

struct DeckState {
    session: SwipeSession<SqliteKeyValueRepository>,
    catalog: CatalogCache,
}

/// Health check for bridge wiring. Always `pong`.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Version of the linked `swipedeck_core`.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Starts engine file logging.
///
/// `level` is `trace|debug|info|warn|error` in any case; `log_dir` must be
/// absolute. Repeating the same call is harmless.
///
/// # FFI contract
/// - Returns an empty string on success, otherwise the reason.
/// - Asking for a different level or directory later is refused.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic response envelope for deck commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckActionResponse {
    /// `true` when the command took effect.
    pub ok: bool,
    /// Cards left in the stack after the operation.
    pub remaining: u32,
    /// Short status text for logs and UI.
    pub message: String,
}

impl DeckActionResponse {
    fn success(message: impl Into<String>, remaining: usize) -> Self {
        Self {
            ok: true,
            remaining: to_u32(remaining),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            remaining: 0,
            message: message.into(),
        }
    }
}

/// Card transform to apply this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardVisualView {
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    /// Animated transition length; `None` follows the pointer directly.
    pub transition_ms: Option<u32>,
}

/// Result of a pointer release.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckGestureResponse {
    /// `swipe_left|swipe_right|snap_back`, or `ignored` when no drag was open.
    pub outcome: String,
    pub dx: f64,
    pub visual: Option<CardVisualView>,
    /// Whether the host must keep routing the pointer to the card.
    pub pointer_captured: bool,
    pub text_selection_enabled: bool,
}

/// Swipe applied to the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSwipeView {
    pub card_id: Option<String>,
    /// `left|right`.
    pub direction: String,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphView {
    /// `heart|cross`.
    pub kind: String,
    pub scale: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckCardView {
    pub card_id: Option<String>,
    /// Card payload as JSON, passed through untouched.
    pub payload_json: String,
    pub is_front: bool,
    pub z_index: i32,
    pub translate_y: f64,
    pub interactive: bool,
    pub visual: CardVisualView,
}

/// Everything the host draws for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckFrameView {
    /// Bottom-most first.
    pub cards: Vec<DeckCardView>,
    pub live_glyph: Option<GlyphView>,
    pub release_glyph: Option<GlyphView>,
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckSyncResponse {
    pub likes_changed: bool,
    pub seen_changed: bool,
}

/// Opens (or reopens) the process-wide session.
///
/// Input semantics:
/// - `config_json`: partial `EngineConfig` JSON; `None` reads
///   `SWIPEDECK_CONFIG_JSON`, falling back to defaults.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Drops any previous session, including an in-flight fling.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_open(config_json: Option<String>) -> DeckActionResponse {
    let state = match open_state(config_json.as_deref()) {
        Ok(state) => state,
        Err(err) => return DeckActionResponse::failure(format!("deck_open failed: {err}")),
    };
    match DECK.lock() {
        Ok(mut guard) => {
            *guard = Some(state);
            DeckActionResponse::success("Deck opened.", 0)
        }
        Err(_) => DeckActionResponse::failure("deck_open failed: session lock poisoned"),
    }
}

/// Loads a freshly fetched catalog and rebuilds the stack.
///
/// Input semantics:
/// - `items_json`: JSON array of objects; each object's `id` (string or
///   number) identifies it, the whole object is the payload.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Every call is a new catalog identity, so the stack is always rebuilt.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_load_catalog(items_json: String) -> DeckActionResponse {
    let items = match parse_catalog_items(&items_json) {
        Ok(items) => items,
        Err(err) => {
            return DeckActionResponse::failure(format!("deck_load_catalog failed: {err}"))
        }
    };
    match with_deck(|state| {
        let catalog = state.catalog.populate(items);
        state.session.set_catalog(&catalog);
        state.session.deck().len()
    }) {
        Ok(remaining) => DeckActionResponse::success("Catalog loaded.", remaining),
        Err(err) => DeckActionResponse::failure(format!("deck_load_catalog failed: {err}")),
    }
}

/// Re-offers the cached catalog. The stack is kept as is.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Fails when no catalog has been loaded since the last invalidation.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_reload_catalog() -> DeckActionResponse {
    let result = with_deck(|state| {
        let catalog = state.catalog.get()?;
        let rebuilt = state.session.set_catalog(&catalog);
        Some((rebuilt, state.session.deck().len()))
    });
    match result {
        Ok(Some((true, remaining))) => DeckActionResponse::success("Catalog rebuilt.", remaining),
        Ok(Some((false, remaining))) => {
            DeckActionResponse::success("Catalog unchanged.", remaining)
        }
        Ok(None) => DeckActionResponse::failure("deck_reload_catalog failed: no cached catalog"),
        Err(err) => DeckActionResponse::failure(format!("deck_reload_catalog failed: {err}")),
    }
}

/// Drops the cached catalog so the next load is a fresh fetch.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_invalidate_catalog() -> DeckActionResponse {
    match with_deck(|state| {
        state.catalog.invalidate();
        state.session.deck().len()
    }) {
        Ok(remaining) => DeckActionResponse::success("Catalog cache cleared.", remaining),
        Err(err) => DeckActionResponse::failure(format!("deck_invalidate_catalog failed: {err}")),
    }
}

/// Reports the deck viewport width; `None` when unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_set_viewport(width: Option<f64>) -> bool {
    with_deck(|state| {
        state.session.set_viewport(Viewport { width });
    })
    .is_ok()
}

/// Pointer-down on the front card. Returns whether a drag started; the host
/// must then capture the pointer and suppress text selection.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_pointer_down(pointer: i32, x: f64, y: f64) -> bool {
    with_deck(|state| {
        let mut surface = RecordingSurface::new();
        state.session.pointer_down(&mut surface, pointer, x, y)
    })
    .unwrap_or(false)
}

/// Pointer-move during a drag. Returns the card transform, or `None` when
/// the pointer does not own the drag.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_pointer_move(pointer: i32, x: f64, y: f64) -> Option<CardVisualView> {
    with_deck(|state| state.session.pointer_move(pointer, x, y))
        .ok()
        .flatten()
        .map(to_visual_view)
}

#[flutter_rust_bridge::frb(sync)]
pub fn deck_pointer_up(pointer: i32, now_ms: i64) -> DeckGestureResponse {
    release(pointer, ReleaseKind::Up, now_ms)
}

#[flutter_rust_bridge::frb(sync)]
pub fn deck_pointer_cancel(pointer: i32, now_ms: i64) -> DeckGestureResponse {
    release(pointer, ReleaseKind::Cancel, now_ms)
}

#[flutter_rust_bridge::frb(sync)]
pub fn deck_pointer_leave(pointer: i32, now_ms: i64) -> DeckGestureResponse {
    release(pointer, ReleaseKind::Leave, now_ms)
}

/// Keyboard input. `key` is a DOM-style key name (`ArrowLeft`, ...).
/// Returns whether the key swiped the top card.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_key(key: String, now_ms: i64) -> bool {
    with_deck(|state| {
        state
            .session
            .handle_key(KeyInput::from_key_name(key.trim()), to_ms(now_ms))
    })
    .unwrap_or(false)
}

/// Advances time. Returns the swipe applied when a fling finished.
///
/// # FFI contract
/// - Sync call; call once per animation frame.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_tick(now_ms: i64) -> Option<DeckSwipeView> {
    with_deck(|state| state.session.tick(to_ms(now_ms)))
        .ok()
        .flatten()
        .map(|resolution| DeckSwipeView {
            card_id: resolution.card.tracked_id().map(str::to_string),
            direction: resolution.direction.label().to_string(),
            remaining: to_u32(resolution.remaining),
        })
}

/// Current render frame; empty when no session could be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_render(now_ms: i64) -> DeckFrameView {
    match with_deck(|state| state.session.render(to_ms(now_ms))) {
        Ok(frame) => DeckFrameView {
            cards: frame
                .cards
                .into_iter()
                .map(|visible| DeckCardView {
                    card_id: visible.card.tracked_id().map(str::to_string),
                    payload_json: visible.card.payload.to_string(),
                    is_front: visible.role == CardRole::Front,
                    z_index: visible.z_index,
                    translate_y: visible.translate_y,
                    interactive: visible.interactive,
                    visual: to_visual_view(visible.visual),
                })
                .collect(),
            live_glyph: frame.live_glyph.map(to_glyph_view),
            release_glyph: frame.release_glyph.map(to_glyph_view),
            remaining: to_u32(frame.remaining),
        },
        Err(err) => {
            warn!("event=deck_render module=ffi status=error error={err}");
            DeckFrameView {
                cards: Vec::new(),
                live_glyph: None,
                release_glyph: None,
                remaining: 0,
            }
        }
    }
}

/// Applies changes written by other contexts sharing the database.
///
/// Writers in other processes are detected through the SQLite change
/// counter of the session's connection, so no in-process bus is needed.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_sync() -> DeckSyncResponse {
    let report = with_deck(|state| state.session.sync()).unwrap_or_default();
    DeckSyncResponse {
        likes_changed: report.likes_changed,
        seen_changed: report.seen_changed,
    }
}

/// Forgets every dismissal; applies on the next catalog load.
#[flutter_rust_bridge::frb(sync)]
pub fn seen_reset() -> DeckActionResponse {
    match with_deck(|state| {
        state.session.reset_seen();
        state.session.deck().len()
    }) {
        Ok(remaining) => DeckActionResponse::success("Seen history cleared.", remaining),
        Err(err) => DeckActionResponse::failure(format!("seen_reset failed: {err}")),
    }
}

/// Sets like membership of `id`. Returns the membership afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn likes_set(id: String, liked: bool) -> bool {
    with_deck(|state| {
        let likes = state.session.likes_mut();
        if liked {
            likes.like(&id);
        } else {
            likes.unlike(&id);
        }
        likes.is_liked(&id)
    })
    .unwrap_or(false)
}

/// Inverts like membership of `id`. Returns the membership afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn likes_toggle(id: String) -> bool {
    with_deck(|state| state.session.likes_mut().toggle(&id)).unwrap_or(false)
}

#[flutter_rust_bridge::frb(sync)]
pub fn likes_is_liked(id: String) -> bool {
    with_deck(|state| state.session.likes().is_liked(&id)).unwrap_or(false)
}

/// Liked ids in ascending order.
#[flutter_rust_bridge::frb(sync)]
pub fn likes_list() -> Vec<String> {
    with_deck(|state| state.session.likes().liked_ids().iter().cloned().collect())
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn likes_clear() -> DeckActionResponse {
    match with_deck(|state| {
        state.session.likes_mut().clear();
        state.session.deck().len()
    }) {
        Ok(remaining) => DeckActionResponse::success("Likes cleared.", remaining),
        Err(err) => DeckActionResponse::failure(format!("likes_clear failed: {err}")),
    }
}

/// Liked items of the cached catalog as a JSON array, in catalog order.
///
/// # FFI contract
/// - Returns `[]` when nothing is cached or no session could be opened.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn liked_items_json() -> String {
    let items = with_deck(|state| {
        state
            .catalog
            .get()
            .map(|catalog| state.session.likes_mut().liked_items(&catalog))
    });
    match items {
        Ok(Some(items)) => serde_json::to_string(&*items).unwrap_or_else(|err| {
            warn!("event=liked_items module=ffi status=error error={err}");
            "[]".to_string()
        }),
        Ok(None) => "[]".to_string(),
        Err(err) => {
            warn!("event=liked_items module=ffi status=error error={err}");
            "[]".to_string()
        }
    }
}

fn release(pointer: i32, kind: ReleaseKind, now_ms: i64) -> DeckGestureResponse {
    let result = with_deck(|state| {
        let mut surface = RecordingSurface::new();
        let outcome = state
            .session
            .release(&mut surface, pointer, kind, to_ms(now_ms));
        (outcome, surface)
    });
    match result {
        Ok((Some(outcome), surface)) => DeckGestureResponse {
            outcome: outcome_label(&outcome).to_string(),
            dx: outcome.dx(),
            visual: Some(to_visual_view(match outcome {
                GestureOutcome::Swipe { visual, .. } | GestureOutcome::SnapBack { visual, .. } => {
                    visual
                }
            })),
            pointer_captured: surface.is_captured(),
            text_selection_enabled: surface.text_selection_enabled(),
        },
        Ok((None, _)) | Err(_) => DeckGestureResponse {
            outcome: "ignored".to_string(),
            dx: 0.0,
            visual: None,
            pointer_captured: false,
            text_selection_enabled: true,
        },
    }
}

fn with_deck<T>(f: impl FnOnce(&mut DeckState) -> T) -> Result<T, String> {
    let mut guard = DECK
        .lock()
        .map_err(|_| "session lock poisoned".to_string())?;
    if guard.is_none() {
        *guard = Some(open_state(None)?);
    }
    match guard.as_mut() {
        Some(state) => Ok(f(state)),
        None => Err("session unavailable".to_string()),
    }
}

fn open_state(config_json: Option<&str>) -> Result<DeckState, String> {
    let config = resolve_config(config_json)?;
    let db_path = resolve_deck_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("deck DB open failed: {err}"))?;
    let session = SwipeSession::open(
        config,
        SqliteKeyValueRepository::new(conn),
        &StorageBus::new(),
        new_context_id(),
    )
    .map_err(|err| format!("deck session init failed: {err}"))?;
    info!(
        "event=deck_open module=ffi status=ok db_path={}",
        db_path.display()
    );
    Ok(DeckState {
        session,
        catalog: CatalogCache::new(),
    })
}

fn resolve_config(config_json: Option<&str>) -> Result<EngineConfig, String> {
    let raw = match config_json {
        Some(raw) => Some(raw.to_string()),
        None => std::env::var("SWIPEDECK_CONFIG_JSON").ok(),
    };
    match raw.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            EngineConfig::from_json_str(raw).map_err(|err| format!("invalid config: {err}"))
        }
        _ => Ok(EngineConfig::default()),
    }
}

fn resolve_deck_db_path() -> PathBuf {
    DECK_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("SWIPEDECK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DECK_DB_FILE_NAME)
        })
        .clone()
}

fn parse_catalog_items(raw: &str) -> Result<Vec<CardItem>, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| format!("catalog is not valid JSON: {err}"))?;
    let Value::Array(entries) = value else {
        return Err("catalog must be a JSON array".to_string());
    };
    Ok(entries
        .into_iter()
        .map(|entry| {
            let id = match entry.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            };
            match id {
                Some(id) => CardItem::new(id, entry),
                None => CardItem::untracked(entry),
            }
        })
        .collect())
}

fn outcome_label(outcome: &GestureOutcome) -> &'static str {
    match outcome.direction() {
        Some(SwipeDirection::Left) => "swipe_left",
        Some(SwipeDirection::Right) => "swipe_right",
        None => "snap_back",
    }
}

fn to_visual_view(visual: CardVisual) -> CardVisualView {
    CardVisualView {
        offset_x: visual.offset_x,
        offset_y: visual.offset_y,
        rotation_deg: visual.rotation_deg,
        opacity: visual.opacity,
        transition_ms: visual.transition_ms.map(|ms| u32::try_from(ms).unwrap_or(u32::MAX)),
    }
}

fn to_glyph_view(glyph: Glyph) -> GlyphView {
    GlyphView {
        kind: match glyph.kind {
            GlyphKind::Heart => "heart",
            GlyphKind::Cross => "cross",
        }
        .to_string(),
        scale: glyph.scale,
        opacity: glyph.opacity,
    }
}

fn to_ms(now_ms: i64) -> u64 {
    u64::try_from(now_ms).unwrap_or(0)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
