//! Benchmark tests for clipdeck-core operations
//!
//! Run with: cargo bench -p clipdeck-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::sync::watch;

use clipdeck_core::{
    extract_error, reduce, Catalog, EngineError, Envelope, ErrorLogEvent, MediaEngine,
    PlaybackController, PlaybackState, PlayerConfig, PlayerEvent, SimulatedEngine, StateCore,
    TimeControlStatus,
};

// ============================================================================
// Helpers
// ============================================================================

/// Engine-like signal stream: buffering, playing, occasional pauses, end
fn generate_signals(count: usize) -> Vec<PlayerEvent> {
    let mut events = Vec::with_capacity(count + 1);
    for i in 0..count {
        let status = match i % 7 {
            0 => TimeControlStatus::WaitingToPlayAtSpecifiedRate,
            3 => TimeControlStatus::Paused,
            _ => TimeControlStatus::Playing,
        };
        events.push(PlayerEvent::TimeControl(status));
    }
    events.push(PlayerEvent::ReachedEnd);
    events
}

// ============================================================================
// Reducer Benchmarks
// ============================================================================

fn bench_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reducer");

    for &count in &[10, 100, 1_000] {
        let events = generate_signals(count);
        group.bench_with_input(BenchmarkId::new("fold", count), &events, |b, events| {
            b.iter(|| {
                let mut state = PlaybackState::Idle;
                for event in events {
                    if let Some(next) = reduce(&state, event).published() {
                        state = next.clone();
                    }
                }
                black_box(state)
            });
        });
    }

    group.finish();
}

fn bench_state_core(c: &mut Criterion) {
    let mut group = c.benchmark_group("State Core");

    for &count in &[10, 100, 1_000] {
        let events = generate_signals(count);
        group.bench_with_input(BenchmarkId::new("handle", count), &events, |b, events| {
            b.iter(|| {
                let (tx, _rx) = watch::channel(PlaybackState::Idle);
                let mut core = StateCore::new(Arc::new(tx), false);
                core.handle(Envelope::new(1, PlayerEvent::Reset));
                for event in events {
                    // every other envelope belongs to a superseded session
                    core.handle(Envelope::new(0, event.clone()));
                    core.handle(Envelope::new(1, event.clone()));
                }
                black_box(core.state().clone())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Error Extraction Benchmarks
// ============================================================================

fn bench_error_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Error Extraction");

    let item_level = SimulatedEngine::new();
    item_level.set_item_error(Some(EngineError::new("AVFoundationErrorDomain", -11800)));
    group.bench_function("item_error", |b| {
        b.iter(|| black_box(extract_error(&item_level).ok()))
    });

    for &entries in &[1, 50] {
        let logged = SimulatedEngine::new();
        for i in 0..entries {
            logged.push_error_log(ErrorLogEvent::new("CoreMediaErrorDomain", -12_000 - i as i64));
        }
        group.bench_with_input(BenchmarkId::new("error_log", entries), &logged, |b, engine| {
            b.iter(|| black_box(extract_error(engine).ok()))
        });
    }

    group.finish();
}

// ============================================================================
// Controller Benchmarks
// ============================================================================

fn bench_clip_switching(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let catalog = Catalog::reference();
    let engine = Arc::new(SimulatedEngine::new());
    let mut controller = rt.block_on(async {
        PlaybackController::new(engine.clone(), PlayerConfig::default())
    });

    c.bench_function("switch_and_settle", |b| {
        let mut index = 0;
        b.iter(|| {
            index = (index + 1) % catalog.len();
            controller.on_selection_changed(&catalog.items()[index]);
            engine.emit_time_control(TimeControlStatus::Playing);
            engine.clear_commands();
            rt.block_on(controller.flush()).unwrap();
            black_box(engine.current_item())
        });
    });
}

criterion_group!(
    reducer_benches,
    bench_reducer,
    bench_state_core,
);

criterion_group!(
    extraction_benches,
    bench_error_extraction,
);

criterion_group!(
    controller_benches,
    bench_clip_switching,
);

criterion_main!(
    reducer_benches,
    extraction_benches,
    controller_benches,
);
