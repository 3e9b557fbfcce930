//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `swipedeck_core` linkage.
//! - Drive one scripted session against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use serde_json::json;
use std::process::ExitCode;
use swipedeck_core::db::open_db_in_memory;
use swipedeck_core::{
    new_context_id, CardItem, CatalogCache, DetachedSurface, EngineConfig, KeyInput,
    SqliteKeyValueRepository, StorageBus, SwipeSession, Viewport,
};

const SEED: u64 = 7;

fn main() -> ExitCode {
    println!("swipedeck_core ping={}", swipedeck_core::ping());
    println!("swipedeck_core version={}", swipedeck_core::core_version());

    match run_scripted_session() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scripted session failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_scripted_session() -> Result<(), String> {
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let mut session = SwipeSession::open(
        EngineConfig::default(),
        SqliteKeyValueRepository::new(conn),
        &StorageBus::new(),
        new_context_id(),
    )
    .map_err(|err| err.to_string())?
    .with_seed(SEED);
    session.set_viewport(Viewport::with_width(1000.0));

    let mut cache = CatalogCache::new();
    let catalog = cache.populate(
        ["a", "b", "c"]
            .into_iter()
            .map(|id| CardItem::new(id, json!({ "title": id.to_uppercase() })))
            .collect(),
    );
    session.set_catalog(&catalog);
    println!("deck size={}", session.deck().len());

    // Pointer swipe to the left, finished by the fling timer.
    let mut surface = DetachedSurface;
    session.pointer_down(&mut surface, 1, 500.0, 300.0);
    session.pointer_move(1, 250.0, 310.0);
    let outcome = session
        .pointer_up(&mut surface, 1, 0)
        .ok_or("pointer release ignored")?;
    println!("release outcome={:?}", outcome.direction());
    let fling_ms = session.config().fling_ms;
    let swiped = session.tick(fling_ms).ok_or("fling did not complete")?;
    println!(
        "swiped id={} direction={} remaining={}",
        swiped.card.tracked_id().unwrap_or("-"),
        swiped.direction.label(),
        swiped.remaining
    );

    // Keyboard swipe to the right applies immediately.
    session.handle_key(KeyInput::ArrowRight, fling_ms + 1);
    println!("deck size after key={}", session.deck().len());

    let liked: Vec<String> = session.likes().liked_ids().iter().cloned().collect();
    let seen: Vec<String> = session.seen().snapshot().iter().cloned().collect();
    println!("liked={liked:?} seen={seen:?}");

    let unchanged = !session.set_catalog(&cache.get().ok_or("catalog cache empty")?);
    println!("same catalog rebuild skipped={unchanged}");
    Ok(())
}
