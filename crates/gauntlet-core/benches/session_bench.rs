use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gauntlet_core::{BaseStats, CombatSession, ModifierSet, SessionConfig, StatEngine};
use glam::Vec2;

fn crowded_session(character: &str, enemies: usize) -> CombatSession {
    let mut session = CombatSession::with_defaults(SessionConfig::with_seed(7));
    session.select_character(character).expect("default character");
    for i in 0..enemies {
        let angle = i as f32 / enemies as f32 * std::f32::consts::TAU;
        session
            .spawn_random_enemy(Vec2::from_angle(angle) * 600.0)
            .expect("default enemies");
    }
    session
}

fn bench_session_step(c: &mut Criterion) {
    // Far ring so the player survives the whole measurement
    let mut session = crowded_session("ranger", 50);
    let mut wall = 0.0;

    c.bench_function("session_step_50_enemies", |b| {
        b.iter(|| {
            wall += 16.0;
            session.step(black_box(wall));
        })
    });
}

fn bench_session_step_crowded(c: &mut Criterion) {
    let mut session = crowded_session("astromancer", 200);
    let mut wall = 0.0;

    c.bench_function("session_step_200_enemies", |b| {
        b.iter(|| {
            wall += 16.0;
            session.step(black_box(wall));
        })
    });
}

fn bench_stat_compute(c: &mut Criterion) {
    let base = BaseStats::new(10.0, 160.0).with_ability(2.0, 1400.0, 60.0);
    let mut mods = ModifierSet::new();
    mods.add_bonus("health", 4.0).expect("known stat");
    mods.multiply("abilityCooldown", 0.8).expect("known stat");
    let previous = StatEngine::compute(&base, &mods, None, true);

    c.bench_function("stat_compute", |b| {
        b.iter(|| black_box(StatEngine::compute(&base, &mods, Some(&previous), false)))
    });
}

criterion_group!(benches, bench_session_step, bench_session_step_crowded, bench_stat_compute);
criterion_main!(benches);
