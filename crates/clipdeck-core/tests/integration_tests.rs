//! Integration tests for ClipDeck Core

use clipdeck_core::{
    Catalog, EngineError, ErrorLogEvent, MediaEngine, PlaybackController, PlaybackState,
    PlayerConfig, PlayerStatus, PlayerView, SimulatedEngine, TimeControlStatus,
};
use std::sync::Arc;
use std::time::Duration;

fn controller() -> (PlaybackController<SimulatedEngine>, Arc<SimulatedEngine>, Catalog) {
    let engine = Arc::new(SimulatedEngine::new());
    let controller = PlaybackController::new(engine.clone(), PlayerConfig::default());
    (controller, engine, Catalog::reference())
}

// =============================================================================
// Session Replacement Tests
// =============================================================================

#[tokio::test]
async fn test_end_to_end_switch_scenario() {
    let (mut controller, engine, catalog) = controller();
    let a = catalog.get(0).unwrap();
    let b = catalog.get(1).unwrap();

    controller.load_and_play(a);
    let item_a = engine.current_item().unwrap();
    let stale_handlers = engine.time_control_handlers();

    engine.emit_time_control(TimeControlStatus::WaitingToPlayAtSpecifiedRate);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::WaitingToPlayAtRate);

    engine.emit_time_control(TimeControlStatus::Playing);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);

    engine.finish_item(item_a);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::ReachedEnd);

    controller.on_selection_changed(b);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Idle);

    // callbacks captured from clip A still fire after the switch
    for handler in &stale_handlers {
        handler(TimeControlStatus::Playing);
    }
    engine.finish_item(item_a);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_stale_signal_does_not_override_new_session_state() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    let stale_handlers = engine.time_control_handlers();

    controller.on_selection_changed(catalog.get(2).unwrap());
    engine.emit_time_control(TimeControlStatus::WaitingToPlayAtSpecifiedRate);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::WaitingToPlayAtRate);

    for handler in &stale_handlers {
        handler(TimeControlStatus::Playing);
    }
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::WaitingToPlayAtRate);
}

#[tokio::test]
async fn test_queued_stale_events_are_discarded() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());

    // emitted but not yet consumed when the switch happens
    engine.emit_time_control(TimeControlStatus::Playing);
    engine.emit_time_control(TimeControlStatus::Paused);
    controller.on_selection_changed(catalog.get(1).unwrap());
    controller.flush().await.unwrap();

    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_new_session_recovers_from_error() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    engine.set_item_error(Some(EngineError::new("AVFoundationErrorDomain", -11828)));
    engine.emit_status(PlayerStatus::Failed);
    controller.flush().await.unwrap();
    assert!(controller.state().is_error());

    controller.on_selection_changed(catalog.get(1).unwrap());
    engine.emit_time_control(TimeControlStatus::Playing);
    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
}

// =============================================================================
// End Of Content Tests
// =============================================================================

#[tokio::test]
async fn test_end_of_content_overrides_rate_status() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    engine.emit_time_control(TimeControlStatus::Playing);

    // the pause action fires a rate change right around the end notification
    engine.finish_current_item();
    engine.emit_time_control(TimeControlStatus::Paused);
    controller.flush().await.unwrap();

    assert_eq!(controller.state(), PlaybackState::ReachedEnd);
}

#[tokio::test]
async fn test_end_action_is_pause() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    assert_eq!(
        engine.action_at_item_end(),
        Some(clipdeck_core::ActionAtItemEnd::Pause)
    );
}

// =============================================================================
// Error Extraction Tests
// =============================================================================

#[tokio::test]
async fn test_item_error_wins_over_other_sources() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());

    engine.set_item_error(Some(EngineError::new("item-domain", 1)));
    engine.set_player_error(Some(EngineError::new("player-domain", 2)));
    engine.push_error_log(ErrorLogEvent::new("log-domain", 3));
    engine.emit_status(PlayerStatus::Failed);
    controller.flush().await.unwrap();

    assert_eq!(controller.state(), PlaybackState::Error("item-domain: 1".to_string()));
}

#[tokio::test]
async fn test_error_log_used_last() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());

    engine.push_error_log(ErrorLogEvent::new("CoreMediaErrorDomain", -12660).with_comment("HTTP 403"));
    engine.push_error_log(ErrorLogEvent::new("CoreMediaErrorDomain", -12938));
    engine.emit_status(PlayerStatus::Failed);
    controller.flush().await.unwrap();

    assert_eq!(
        controller.state(),
        PlaybackState::Error("CoreMediaErrorDomain: -12660".to_string())
    );
}

#[tokio::test]
async fn test_failure_without_detail_changes_nothing() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    engine.emit_time_control(TimeControlStatus::Playing);
    controller.flush().await.unwrap();

    let mut rx = controller.subscribe();
    engine.emit_status(PlayerStatus::Failed);
    controller.flush().await.unwrap();

    assert!(!rx.has_changed().unwrap());
    assert_eq!(controller.state(), PlaybackState::Playing);
}

// =============================================================================
// Publication Tests
// =============================================================================

#[tokio::test]
async fn test_identical_signals_each_publish() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());
    controller.flush().await.unwrap();

    let mut rx = controller.subscribe();
    for _ in 0..2 {
        engine.emit_time_control(TimeControlStatus::Playing);
        controller.flush().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), PlaybackState::Playing);
    }
}

#[tokio::test]
async fn test_signals_from_engine_threads() {
    let (mut controller, engine, catalog) = controller();
    controller.load_and_play(catalog.get(0).unwrap());

    let remote = engine.clone();
    std::thread::spawn(move || {
        remote.emit_time_control(TimeControlStatus::WaitingToPlayAtSpecifiedRate);
        remote.emit_time_control(TimeControlStatus::Playing);
    })
    .join()
    .unwrap();

    controller.flush().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
}

// =============================================================================
// View Tests
// =============================================================================

#[tokio::test]
async fn test_view_round_trip() {
    let engine = Arc::new(SimulatedEngine::new());
    let mut view = PlayerView::new(Catalog::reference(), engine.clone(), PlayerConfig::default()).unwrap();

    assert!(view.play_button_visible());
    assert!(view.tap_play());

    engine.emit_time_control(TimeControlStatus::Playing);
    let state = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let state = view.changed().await.unwrap();
            if state == PlaybackState::Playing {
                break state;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(state, PlaybackState::Playing);
    assert!(!view.play_button_visible());

    view.select(2).unwrap();
    view.flush().await.unwrap();
    assert_eq!(view.state(), PlaybackState::Idle);
    assert!(view.play_button_visible());
    assert_eq!(engine.observer_count(), 3);
}
