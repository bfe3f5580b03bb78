//! Headless survival runner.
//!
//! Plays a scripted run against the default catalogs without rendering:
//! enemies arrive in waves on a ring around the player, the player circles
//! the arena center, and every level-up takes the first offered upgrade.
//! The final HUD snapshot is printed as JSON.
//!
//! ```text
//! gauntlet-headless [CONFIG.json] [CHARACTER] [WAVES]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use gauntlet_core::{CombatSession, Event, SessionConfig};
use glam::Vec2;
use tracing::{info, warn};

const FRAME_MS: f64 = 16.0;
const FRAMES_PER_WAVE: u32 = 300;
const SPAWN_RING: f32 = 500.0;

fn load_config(path: Option<&str>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let json = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("reading config {path}"))?;
    SessionConfig::from_json_str(&json).with_context(|| format!("parsing config {path}"))
}

#[derive(Debug, Default)]
struct RunTally {
    kills: usize,
    level_ups: usize,
    damage_taken: f32,
}

impl RunTally {
    fn record(&mut self, events: &[Event], player: Option<gauntlet_core::EntityId>) {
        for event in events {
            match event {
                Event::EntityKilled { .. } => self.kills += 1,
                Event::LevelUp { .. } => self.level_ups += 1,
                Event::DamageDealt { target, amount, .. } if Some(*target) == player => {
                    self.damage_taken += amount;
                }
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let character = args.get(1).map_or("vanguard", String::as_str);
    let waves: u32 = match args.get(2) {
        Some(raw) => raw.parse().with_context(|| format!("invalid wave count {raw}"))?,
        None => 5,
    };

    let upgrade_choices = config.upgrade_choices;
    let mut session = CombatSession::with_defaults(config);
    session.select_character(character)?;
    let player = session.player().map(|p| p.entity);

    let mut tally = RunTally::default();
    let mut wall = 0.0;
    let mut frame: u32 = 0;

    'run: for wave in 1..=waves {
        let count = 4 + wave as usize * 2;
        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            session.spawn_random_enemy(Vec2::from_angle(angle) * SPAWN_RING)?;
        }
        if wave == waves {
            session.spawn_enemy("overlord", Vec2::new(0.0, SPAWN_RING))?;
        }
        info!(wave, enemies = session.enemy_count(), "wave started");

        for _ in 0..FRAMES_PER_WAVE {
            frame += 1;
            #[allow(clippy::cast_precision_loss)]
            let heading = frame as f32 / 60.0;
            session.move_player(Vec2::from_angle(heading));
            wall += FRAME_MS;
            session.step(wall);

            tally.record(&session.drain_events(), player);

            let pending = session.player().map_or(0, |p| p.pending_upgrades);
            for _ in 0..pending {
                let offer = session.offer_upgrades(upgrade_choices)?;
                match offer.first() {
                    Some(upgrade) => {
                        session.apply_upgrade(&upgrade.id)?;
                        info!(upgrade = %upgrade.id, "upgrade picked");
                    }
                    None => {
                        warn!("no upgrades left to offer");
                        break;
                    }
                }
            }

            if session.is_game_over() {
                break 'run;
            }
        }
    }

    info!(
        kills = tally.kills,
        level_ups = tally.level_ups,
        damage_taken = tally.damage_taken,
        frames = frame,
        "run finished"
    );
    let hud = session.hud().context("no character selected")?;
    println!("{}", serde_json::to_string_pretty(&hud)?);
    Ok(())
}
