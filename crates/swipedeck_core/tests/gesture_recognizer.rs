use swipedeck_core::gesture::{GestureParams, GestureRecognizer, SurfaceCall};
use swipedeck_core::{
    FlingTiming, GestureOutcome, GesturePhase, RecordingSurface, ReleaseKind, SwipeDirection,
    Viewport,
};

const POINTER: i32 = 7;

fn recognizer() -> GestureRecognizer {
    GestureRecognizer::new(GestureParams::default(), FlingTiming::new(320))
}

fn drag_to(
    recognizer: &mut GestureRecognizer,
    surface: &mut RecordingSurface,
    dx: f64,
    dy: f64,
) {
    assert!(recognizer.pointer_down(surface, POINTER, 400.0, 300.0));
    recognizer.pointer_move(POINTER, 400.0 + dx / 2.0, 300.0 + dy / 2.0);
    recognizer.pointer_move(POINTER, 400.0 + dx, 300.0 + dy);
}

#[test]
fn drag_beyond_threshold_swipes_in_direction_of_dx() {
    let viewport = Viewport::with_width(1000.0);
    for (dx, expected) in [
        (-221.0, SwipeDirection::Left),
        (300.0, SwipeDirection::Right),
    ] {
        let mut recognizer = recognizer();
        let mut surface = RecordingSurface::new();
        drag_to(&mut recognizer, &mut surface, dx, 15.0);

        let outcome = recognizer
            .release(&mut surface, POINTER, ReleaseKind::Up, viewport)
            .unwrap();

        assert_eq!(outcome.direction(), Some(expected));
        assert_eq!(recognizer.phase(), GesturePhase::Flinging(expected));
        match outcome {
            GestureOutcome::Swipe { visual, .. } => {
                assert_eq!(visual.offset_x, expected.sign() * 1400.0);
                assert_eq!(visual.offset_y, 15.0);
                assert_eq!(visual.transition_ms, Some(320));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

#[test]
fn drag_exactly_at_threshold_snaps_back() {
    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();
    drag_to(&mut recognizer, &mut surface, -220.0, 0.0);

    let outcome = recognizer
        .release(
            &mut surface,
            POINTER,
            ReleaseKind::Up,
            Viewport::with_width(1000.0),
        )
        .unwrap();

    match outcome {
        GestureOutcome::SnapBack { dx, visual } => {
            assert_eq!(dx, -220.0);
            assert_eq!(visual.offset_x, 0.0);
            assert_eq!(visual.offset_y, 0.0);
            assert_eq!(visual.rotation_deg, 0.0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(recognizer.phase(), GesturePhase::Idle);
}

#[test]
fn narrow_viewport_scales_threshold_down() {
    let viewport = Viewport::with_width(500.0);
    let threshold = GestureParams::default().threshold(viewport);
    assert!((threshold - 140.0).abs() < 1e-9);

    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();
    drag_to(&mut recognizer, &mut surface, 150.0, 0.0);
    let outcome = recognizer
        .release(&mut surface, POINTER, ReleaseKind::Up, viewport)
        .unwrap();
    assert_eq!(outcome.direction(), Some(SwipeDirection::Right));
}

#[test]
fn unknown_width_falls_back_to_fixed_threshold() {
    let params = GestureParams::default();
    assert_eq!(params.threshold(Viewport::default()), 200.0);

    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();
    drag_to(&mut recognizer, &mut surface, 210.0, 0.0);
    let outcome = recognizer
        .release(&mut surface, POINTER, ReleaseKind::Up, Viewport::default())
        .unwrap();
    assert_eq!(outcome.direction(), Some(SwipeDirection::Right));
}

#[test]
fn cancel_and_leave_resolve_like_pointer_up() {
    let viewport = Viewport::with_width(1000.0);
    for dx in [-250.0, 100.0] {
        let outcomes: Vec<Option<SwipeDirection>> =
            [ReleaseKind::Up, ReleaseKind::Cancel, ReleaseKind::Leave]
                .into_iter()
                .map(|kind| {
                    let mut recognizer = recognizer();
                    let mut surface = RecordingSurface::new();
                    drag_to(&mut recognizer, &mut surface, dx, 0.0);
                    recognizer
                        .release(&mut surface, POINTER, kind, viewport)
                        .unwrap()
                        .direction()
                })
                .collect();
        assert!(outcomes.iter().all(|outcome| *outcome == outcomes[0]));
    }
}

#[test]
fn surface_is_captured_during_drag_and_released_on_outcome() {
    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();

    drag_to(&mut recognizer, &mut surface, 50.0, 0.0);
    assert!(surface.is_captured());
    assert!(!surface.text_selection_enabled());

    recognizer.release(
        &mut surface,
        POINTER,
        ReleaseKind::Leave,
        Viewport::with_width(1000.0),
    );
    assert!(!surface.is_captured());
    assert!(surface.text_selection_enabled());
    assert_eq!(
        surface.calls,
        vec![
            SurfaceCall::Capture(POINTER),
            SurfaceCall::TextSelection(false),
            SurfaceCall::Release(POINTER),
            SurfaceCall::TextSelection(true),
        ]
    );
}

#[test]
fn move_tracks_pointer_and_rotates() {
    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();
    recognizer.pointer_down(&mut surface, POINTER, 10.0, 10.0);

    let visual = recognizer.pointer_move(POINTER, 70.0, 25.0).unwrap();

    assert_eq!(visual.offset_x, 60.0);
    assert_eq!(visual.offset_y, 15.0);
    assert_eq!(visual.rotation_deg, 3.0);
    assert_eq!(visual.transition_ms, None);
}

#[test]
fn foreign_pointer_events_are_ignored() {
    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();
    drag_to(&mut recognizer, &mut surface, 300.0, 0.0);

    assert!(!recognizer.pointer_down(&mut surface, 8, 0.0, 0.0));
    assert!(recognizer.pointer_move(8, 0.0, 0.0).is_none());
    assert!(recognizer
        .release(&mut surface, 8, ReleaseKind::Up, Viewport::default())
        .is_none());
    assert!(recognizer.is_dragging());
}

#[test]
fn release_without_drag_is_ignored() {
    let mut recognizer = recognizer();
    let mut surface = RecordingSurface::new();

    assert!(recognizer
        .release(&mut surface, POINTER, ReleaseKind::Up, Viewport::default())
        .is_none());
    assert!(surface.calls.is_empty());
}
