use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use biosync::biometrics::BiometricEngine;
use biosync::config::RetriggerWindows;
use biosync::models::{BiometricState, CooldownState, ExerciseType, Gender, LastTriggered};
use biosync::profile::{ProfileInputs, UserProfile};
use biosync::recommendations::{EvaluationContext, IdSequence, RecommendationEngine};
use biosync::session::Simulation;

/// Benchmarks for the per-tick simulation path
///
/// A tick has a one second budget in real time; these keep an eye on
/// how far below that the update, the rules and the full aggregate sit.

fn create_benchmark_profile() -> UserProfile {
    let mut profile = UserProfile::new(ProfileInputs {
        name: "Bench".to_string(),
        age: Some(40),
        gender: Some(Gender::Female),
        weight_kg: Some(65.0),
        height_cm: Some(170.0),
        ..ProfileInputs::default()
    });
    profile.add_medical_condition("Diabetes");
    profile.add_medical_condition("Hypertension");
    profile
}

fn bench_biometric_update(c: &mut Criterion) {
    let engine = BiometricEngine::default();
    let profile = create_benchmark_profile();
    let state = BiometricState {
        heart_rate: 150,
        hydration_level: 80.0,
        glycogen_stores: 60.0,
        core_temp_c: 38.2,
        ..BiometricState::default()
    };

    c.bench_function("biometric_advance", |b| {
        b.iter(|| {
            engine.advance(
                black_box(&state),
                black_box(600),
                &ExerciseType::Running,
                &profile,
                CooldownState::default(),
            )
        })
    });
}

fn bench_recommendation_rules(c: &mut Criterion) {
    let engine = RecommendationEngine::new(RetriggerWindows::default());
    let profile = create_benchmark_profile();
    let state = BiometricState {
        heart_rate: 165,
        hydration_level: 65.0,
        glycogen_stores: 35.0,
        core_temp_c: 38.6,
        ..BiometricState::default()
    };
    let ctx = EvaluationContext {
        state: &state,
        profile: &profile,
        exercise: &ExerciseType::Cycling,
        elapsed: 900,
        report: None,
    };

    c.bench_function("recommendation_evaluate", |b| {
        b.iter(|| {
            let mut ids = IdSequence::default();
            engine.evaluate(black_box(&ctx), &[], LastTriggered::default(), &mut ids)
        })
    });
}

fn bench_session_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Session Ticks");

    for &ticks in &[60u64, 600, 3600] {
        group.throughput(Throughput::Elements(ticks));
        group.bench_with_input(BenchmarkId::new("tick", ticks), &ticks, |b, &ticks| {
            b.iter(|| {
                let mut sim = Simulation::default();
                sim.start(create_benchmark_profile()).ok();
                for _ in 0..ticks {
                    black_box(sim.tick());
                }
                sim.stop();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_biometric_update,
    bench_recommendation_rules,
    bench_session_ticks
);
criterion_main!(benches);
