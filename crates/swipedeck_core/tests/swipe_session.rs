use serde_json::json;
use std::sync::{Arc, Mutex};
use swipedeck_core::{
    new_context_id, CardItem, CardRole, Catalog, DeckChange, DetachedSurface, EngineConfig,
    GesturePhase, GlyphKind, InMemoryKeyValueRepository, KeyInput, KeyValueRepository,
    RecordingSurface, StorageBus, SwipeDirection, SwipeSession, Viewport,
};

const POINTER: i32 = 1;

fn catalog(ids: &[&str]) -> Catalog {
    Catalog::new(
        ids.iter()
            .map(|id| CardItem::new(*id, json!({ "name": id })))
            .collect(),
    )
}

fn session(repo: &InMemoryKeyValueRepository) -> SwipeSession<InMemoryKeyValueRepository> {
    let mut session = SwipeSession::open(
        EngineConfig::default(),
        repo.clone(),
        &StorageBus::new(),
        new_context_id(),
    )
    .unwrap()
    .with_seed(42);
    session.set_viewport(Viewport::with_width(1000.0));
    session
}

fn top_id(session: &SwipeSession<InMemoryKeyValueRepository>) -> String {
    session
        .deck()
        .top()
        .and_then(CardItem::tracked_id)
        .unwrap()
        .to_string()
}

fn deck_ids(session: &SwipeSession<InMemoryKeyValueRepository>) -> Vec<String> {
    session
        .deck()
        .cards()
        .iter()
        .filter_map(|card| card.tracked_id().map(str::to_string))
        .collect()
}

fn drag_and_release(
    session: &mut SwipeSession<InMemoryKeyValueRepository>,
    dx: f64,
    now_ms: u64,
) -> Option<SwipeDirection> {
    let mut surface = DetachedSurface;
    assert!(session.pointer_down(&mut surface, POINTER, 500.0, 400.0));
    session.pointer_move(POINTER, 500.0 + dx, 410.0);
    session
        .pointer_up(&mut surface, POINTER, now_ms)
        .unwrap()
        .direction()
}

#[test]
fn swipe_scenario_updates_stack_and_both_sets() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    let first_catalog = catalog(&["a", "b", "c"]);

    assert!(session.set_catalog(&first_catalog));
    let mut initial = deck_ids(&session);
    initial.sort();
    assert_eq!(initial, vec!["a", "b", "c"]);

    let liked = top_id(&session);
    let order_before = deck_ids(&session);
    assert_eq!(
        drag_and_release(&mut session, -300.0, 1_000),
        Some(SwipeDirection::Left)
    );
    let resolution = session.tick(1_320).unwrap();
    assert_eq!(resolution.card.tracked_id(), Some(liked.as_str()));
    assert_eq!(resolution.remaining, 2);
    assert_eq!(deck_ids(&session), order_before[..2].to_vec());
    assert!(session.seen().is_seen(&liked));
    assert!(session.likes().is_liked(&liked));

    let passed = top_id(&session);
    assert_eq!(
        drag_and_release(&mut session, 300.0, 2_000),
        Some(SwipeDirection::Right)
    );
    session.tick(2_320).unwrap();
    assert_eq!(session.deck().len(), 1);
    assert!(session.seen().is_seen(&passed));
    assert!(session.likes().is_liked(&liked));
    assert!(!session.likes().is_liked(&passed));

    assert!(!session.set_catalog(&first_catalog.clone()));
    assert_eq!(session.deck().len(), 1);

    assert!(session.set_catalog(&catalog(&["a", "b", "c"])));
    let remaining = deck_ids(&session);
    assert_eq!(remaining.len(), 1);
    assert!(!remaining.contains(&liked));
    assert!(!remaining.contains(&passed));

    let stored_seen = repo.get("gc_seen_v1").unwrap().unwrap();
    assert!(stored_seen.contains(&format!("\"{liked}\"")));
    assert!(stored_seen.contains(&format!("\"{passed}\"")));
}

#[test]
fn pop_lands_exactly_after_fling_duration() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b"]));
    let flung = top_id(&session);

    drag_and_release(&mut session, 250.0, 5_000);
    assert_eq!(session.pending_fling().unwrap().due_at_ms, 5_320);
    assert_eq!(session.pending_fling().unwrap().card_id.as_deref(), Some(flung.as_str()));
    assert_eq!(
        session.gesture_phase(),
        GesturePhase::Flinging(SwipeDirection::Right)
    );

    assert!(session.tick(5_319).is_none());
    assert_eq!(session.deck().len(), 2);
    assert!(session.tick(5_320).is_some());
    assert_eq!(session.deck().len(), 1);
    assert!(session.tick(9_999).is_none());
    assert_eq!(session.gesture_phase(), GesturePhase::Idle);
}

#[test]
fn snap_back_leaves_stack_and_sets_unchanged() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    session.set_catalog(&catalog(&["a", "b"]));
    let before = deck_ids(&session);

    assert_eq!(drag_and_release(&mut session, -220.0, 100), None);
    assert!(session.pending_fling().is_none());
    assert!(session.tick(10_000).is_none());

    assert_eq!(deck_ids(&session), before);
    assert!(session.likes().liked_ids().is_empty());
    assert!(session.seen().snapshot().is_empty());
    assert_eq!(repo.get("gc_likes_v1").unwrap(), None);

    let front = session.render(10_000).front().cloned().unwrap();
    assert_eq!(front.visual.offset_x, 0.0);
    assert_eq!(front.visual.offset_y, 0.0);
}

#[test]
fn deck_observers_run_before_store_mutations() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    session.set_catalog(&catalog(&["a"]));
    let log = Arc::new(Mutex::new(Vec::new()));

    let deck_log = Arc::clone(&log);
    let probe = repo.clone();
    session.observe_deck(move |change| {
        if let DeckChange::Popped { remaining, .. } = change {
            let stored_seen = probe.get("gc_seen_v1").unwrap();
            deck_log
                .lock()
                .unwrap()
                .push(format!("deck remaining={remaining} seen={stored_seen:?}"));
        }
    });
    let likes_log = Arc::clone(&log);
    session
        .likes_mut()
        .observe(move |_, _| likes_log.lock().unwrap().push("likes".to_string()));
    let seen_log = Arc::clone(&log);
    session
        .seen_mut()
        .observe(move |_, _| seen_log.lock().unwrap().push("seen".to_string()));

    assert!(session.handle_key(KeyInput::ArrowLeft, 0));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "deck remaining=0 seen=None".to_string(),
            "likes".to_string(),
            "seen".to_string(),
        ]
    );
}

#[test]
fn right_swipe_of_unliked_card_only_marks_seen() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    session.set_catalog(&catalog(&["a"]));
    let likes_revision = session.likes().revision();

    assert!(session.handle_key(KeyInput::from_key_name("ArrowRight"), 0));

    assert_eq!(session.likes().revision(), likes_revision);
    assert!(session.seen().is_seen("a"));
    assert_eq!(repo.get("gc_likes_v1").unwrap(), None);
}

#[test]
fn keyboard_swipes_immediately_and_respects_in_flight_fling() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b", "c"]));

    assert!(!session.handle_key(KeyInput::from_key_name("Enter"), 0));
    assert!(session.handle_key(KeyInput::ArrowRight, 0));
    assert_eq!(session.deck().len(), 2);

    drag_and_release(&mut session, -400.0, 10);
    assert!(!session.handle_key(KeyInput::ArrowLeft, 20));
    assert_eq!(session.deck().len(), 2);

    session.tick(330).unwrap();
    assert!(session.handle_key(KeyInput::ArrowLeft, 340));
    assert!(session.deck().is_empty());
    assert!(!session.handle_key(KeyInput::ArrowLeft, 350));
}

#[test]
fn pointer_down_on_empty_deck_is_ignored() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&Catalog::default());

    assert!(!session.pointer_down(&mut DetachedSurface, POINTER, 0.0, 0.0));
    assert_eq!(session.gesture_phase(), GesturePhase::Idle);
}

#[test]
fn catalog_change_during_fling_applies_the_swipe_first() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b", "c"]));
    let flung = top_id(&session);

    drag_and_release(&mut session, -300.0, 0);
    assert!(session.set_catalog(&catalog(&["a", "b", "c"])));

    assert!(session.pending_fling().is_none());
    assert!(session.seen().is_seen(&flung));
    assert!(session.likes().is_liked(&flung));
    assert_eq!(session.deck().len(), 2);
    assert!(!deck_ids(&session).contains(&flung));
    assert!(session.tick(1_000).is_none());
}

#[test]
fn untracked_cards_swipe_without_store_effects() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    session.set_catalog(&Catalog::new(vec![CardItem::untracked(json!({ "n": 1 }))]));

    assert!(session.handle_key(KeyInput::ArrowLeft, 0));

    assert!(session.deck().is_empty());
    assert!(session.likes().liked_ids().is_empty());
    assert!(session.seen().snapshot().is_empty());
}

#[test]
fn render_frame_stacks_front_over_back() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b", "c"]));

    let frame = session.render(0);
    assert_eq!(frame.remaining, 3);
    assert_eq!(frame.cards.len(), 2);

    let back = frame.back().unwrap();
    let front = frame.front().unwrap();
    assert_eq!(back.role, CardRole::Back);
    assert_eq!(back.z_index, 101);
    assert_eq!(back.translate_y, 12.0);
    assert!(!back.interactive);
    assert_eq!(front.role, CardRole::Front);
    assert_eq!(front.z_index, 102);
    assert_eq!(front.translate_y, 0.0);
    assert!(front.interactive);
    assert_eq!(Some(&front.card), session.deck().top());
}

#[test]
fn render_frame_tracks_drag_and_release_glyphs() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b"]));
    let mut surface = DetachedSurface;

    session.pointer_down(&mut surface, POINTER, 500.0, 400.0);
    session.pointer_move(POINTER, 390.0, 400.0);
    let dragging = session.render(0);
    let live = dragging.live_glyph.unwrap();
    assert_eq!(live.kind, GlyphKind::Heart);
    assert!((live.scale - (0.8 + 0.4 * 0.5)).abs() < 1e-9);
    assert_eq!(dragging.front().unwrap().visual.offset_x, -110.0);
    assert_eq!(dragging.front().unwrap().visual.rotation_deg, -5.5);

    session.pointer_move(POINTER, 800.0, 400.0);
    session.pointer_up(&mut surface, POINTER, 1_000);
    let released = session.render(1_000);
    assert!(released.live_glyph.is_none());
    assert_eq!(released.release_glyph.unwrap().kind, GlyphKind::Cross);
    assert_eq!(released.front().unwrap().visual.offset_x, 1400.0);

    session.tick(1_380);
    assert!(session.render(1_380).release_glyph.is_none());
}

#[test]
fn reset_seen_takes_effect_on_next_catalog() {
    let repo = InMemoryKeyValueRepository::new();
    let mut session = session(&repo);
    session.set_catalog(&catalog(&["a", "b"]));
    session.handle_key(KeyInput::ArrowLeft, 0);
    session.handle_key(KeyInput::ArrowRight, 0);

    session.reset_seen();
    assert!(session.deck().is_empty());
    assert_eq!(repo.get("gc_seen_v1").unwrap().as_deref(), Some("[]"));

    session.set_catalog(&catalog(&["a", "b"]));
    assert_eq!(session.deck().len(), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let config = EngineConfig {
        fling_ms: 0,
        ..EngineConfig::default()
    };
    let result = SwipeSession::open(
        config,
        InMemoryKeyValueRepository::new(),
        &StorageBus::new(),
        new_context_id(),
    );
    assert!(result.is_err());
}

#[test]
fn catalog_change_mid_drag_waits_for_the_fling_to_land() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b", "c"]));
    let flung = top_id(&session);
    let before = deck_ids(&session);
    let mut surface = RecordingSurface::new();

    assert!(session.pointer_down(&mut surface, POINTER, 500.0, 400.0));
    session.pointer_move(POINTER, 100.0, 400.0);
    assert!(!session.set_catalog(&catalog(&["a", "b", "c", "d"])));
    assert_eq!(deck_ids(&session), before);
    assert_eq!(session.gesture_phase(), GesturePhase::Dragging);
    assert!(session.has_deferred_catalog());

    let outcome = session.pointer_up(&mut surface, POINTER, 1_000).unwrap();
    assert_eq!(outcome.direction(), Some(SwipeDirection::Left));
    assert!(!surface.is_captured());
    assert!(surface.text_selection_enabled());
    assert_eq!(deck_ids(&session), before);

    assert!(session.tick(1_320).is_some());
    assert!(!session.has_deferred_catalog());
    assert_eq!(session.deck().len(), 3);
    assert!(!deck_ids(&session).contains(&flung));
    assert!(session.seen().is_seen(&flung));
}

#[test]
fn catalog_change_mid_drag_applies_on_snap_back() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    session.set_catalog(&catalog(&["a", "b"]));
    let mut surface = RecordingSurface::new();

    assert!(session.pointer_down(&mut surface, POINTER, 500.0, 400.0));
    session.pointer_move(POINTER, 520.0, 400.0);
    assert!(!session.set_catalog(&catalog(&["x", "y", "z"])));
    assert_eq!(session.deck().len(), 2);

    let outcome = session.pointer_up(&mut surface, POINTER, 1_000).unwrap();
    assert_eq!(outcome.direction(), None);
    assert!(!surface.is_captured());
    assert!(surface.text_selection_enabled());
    assert!(!session.has_deferred_catalog());
    let mut ids = deck_ids(&session);
    ids.sort();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[test]
fn reoffering_the_current_catalog_mid_drag_drops_the_held_one() {
    let mut session = session(&InMemoryKeyValueRepository::new());
    let current = catalog(&["a", "b"]);
    session.set_catalog(&current);
    let before = deck_ids(&session);
    let mut surface = RecordingSurface::new();

    assert!(session.pointer_down(&mut surface, POINTER, 500.0, 400.0));
    assert!(!session.set_catalog(&catalog(&["x"])));
    assert!(!session.set_catalog(&current));
    assert!(!session.has_deferred_catalog());

    session.pointer_up(&mut surface, POINTER, 1_000).unwrap();
    assert_eq!(deck_ids(&session), before);
}
